use crate::errors::AppError;
use crate::models::{CustomerProfile, FeatureVector, Gender, Geography};

/// Target-encoded geography constants baked into the trained model.
///
/// These are statistics computed during training and must be reproduced
/// bit-for-bit as literals; they are never recomputed here.
pub const GEOGRAPHY_FRANCE: f64 = 0.5014;
pub const GEOGRAPHY_GERMANY: f64 = 0.2509;
pub const GEOGRAPHY_SPAIN: f64 = 0.2477;

/// Encodes a raw customer profile into the fixed-order feature vector the
/// churn model expects.
///
/// Fails closed: any field outside its declared range produces an
/// `EncodingError` and no vector, and the caller must not invoke the
/// predictor.
///
/// # Arguments
///
/// * `profile` - The validated form submission.
///
/// # Returns
///
/// * `Result<FeatureVector, AppError>` - The encoded vector or an encoding error.
pub fn encode(profile: &CustomerProfile) -> Result<FeatureVector, AppError> {
    validate(profile)?;

    let geography = match profile.geography {
        Geography::France => GEOGRAPHY_FRANCE,
        Geography::Germany => GEOGRAPHY_GERMANY,
        Geography::Spain => GEOGRAPHY_SPAIN,
    };

    let gender = match profile.gender {
        Gender::Male => 0.0,
        Gender::Female => 1.0,
    };

    Ok(FeatureVector {
        credit_score: profile.credit_score as f64,
        geography,
        gender,
        age: profile.age as f64,
        tenure: profile.tenure as f64,
        balance: profile.balance,
        num_products: profile.num_products as f64,
        has_credit_card: if profile.has_credit_card { 1.0 } else { 0.0 },
        is_active_member: if profile.is_active_member { 1.0 } else { 0.0 },
        estimated_salary: profile.estimated_salary,
    })
}

fn validate(profile: &CustomerProfile) -> Result<(), AppError> {
    if !(350..=850).contains(&profile.credit_score) {
        return Err(AppError::EncodingError(format!(
            "credit_score must be between 350 and 850, got {}",
            profile.credit_score
        )));
    }
    if !(18..=92).contains(&profile.age) {
        return Err(AppError::EncodingError(format!(
            "age must be between 18 and 92, got {}",
            profile.age
        )));
    }
    if !(0..=10).contains(&profile.tenure) {
        return Err(AppError::EncodingError(format!(
            "tenure must be between 0 and 10, got {}",
            profile.tenure
        )));
    }
    if !(1..=4).contains(&profile.num_products) {
        return Err(AppError::EncodingError(format!(
            "num_products must be between 1 and 4, got {}",
            profile.num_products
        )));
    }
    if !profile.balance.is_finite() || profile.balance < 0.0 {
        return Err(AppError::EncodingError(format!(
            "balance must be a non-negative number, got {}",
            profile.balance
        )));
    }
    if !profile.estimated_salary.is_finite() || profile.estimated_salary < 0.0 {
        return Err(AppError::EncodingError(format!(
            "estimated_salary must be a non-negative number, got {}",
            profile.estimated_salary
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_profile() -> CustomerProfile {
        CustomerProfile {
            credit_score: 650,
            geography: Geography::France,
            gender: Gender::Male,
            age: 35,
            tenure: 5,
            balance: 0.0,
            num_products: 1,
            has_credit_card: true,
            is_active_member: false,
            estimated_salary: 50000.0,
        }
    }

    #[test]
    fn test_encode_reference_profile() {
        // France / Homme / Oui / Non per the dashboard's reference case
        let vector = encode(&valid_profile()).unwrap();
        assert_eq!(vector.geography, 0.5014);
        assert_eq!(vector.gender, 0.0);
        assert_eq!(vector.has_credit_card, 1.0);
        assert_eq!(vector.is_active_member, 0.0);
        assert_eq!(
            vector.as_array(),
            [650.0, 0.5014, 0.0, 35.0, 5.0, 0.0, 1.0, 1.0, 0.0, 50000.0]
        );
    }

    #[test]
    fn test_geography_constants_exact() {
        let mut profile = valid_profile();

        profile.geography = Geography::Germany;
        assert_eq!(encode(&profile).unwrap().geography, 0.2509);

        profile.geography = Geography::Spain;
        assert_eq!(encode(&profile).unwrap().geography, 0.2477);
    }

    #[test]
    fn test_gender_encoding() {
        let mut profile = valid_profile();
        profile.gender = Gender::Female;
        assert_eq!(encode(&profile).unwrap().gender, 1.0);
    }

    #[test]
    fn test_credit_score_out_of_range_fails_closed() {
        let mut profile = valid_profile();
        profile.credit_score = 300;
        let err = encode(&profile).unwrap_err();
        assert!(matches!(err, AppError::EncodingError(_)));

        profile.credit_score = 900;
        assert!(encode(&profile).is_err());
    }

    #[test]
    fn test_age_bounds() {
        let mut profile = valid_profile();
        profile.age = 17;
        assert!(encode(&profile).is_err());
        profile.age = 18;
        assert!(encode(&profile).is_ok());
        profile.age = 92;
        assert!(encode(&profile).is_ok());
        profile.age = 93;
        assert!(encode(&profile).is_err());
    }

    #[test]
    fn test_negative_balance_rejected() {
        let mut profile = valid_profile();
        profile.balance = -0.01;
        assert!(encode(&profile).is_err());
    }

    #[test]
    fn test_non_finite_salary_rejected() {
        let mut profile = valid_profile();
        profile.estimated_salary = f64::NAN;
        assert!(encode(&profile).is_err());
        profile.estimated_salary = f64::INFINITY;
        assert!(encode(&profile).is_err());
    }

    #[test]
    fn test_num_products_bounds() {
        let mut profile = valid_profile();
        profile.num_products = 0;
        assert!(encode(&profile).is_err());
        profile.num_products = 4;
        assert!(encode(&profile).is_ok());
        profile.num_products = 5;
        assert!(encode(&profile).is_err());
    }
}

/// Property-based tests using proptest
/// Tests invariants that should hold for all encoder and predictor inputs
use churn_insight_api::encoder::{self, GEOGRAPHY_FRANCE, GEOGRAPHY_GERMANY, GEOGRAPHY_SPAIN};
use churn_insight_api::models::{CustomerProfile, FeatureVector, Gender, Geography};
use churn_insight_api::predictor::ChurnModel;
use proptest::prelude::*;

fn geography_strategy() -> impl Strategy<Value = Geography> {
    prop::sample::select(vec![Geography::France, Geography::Germany, Geography::Spain])
}

fn gender_strategy() -> impl Strategy<Value = Gender> {
    prop::sample::select(vec![Gender::Male, Gender::Female])
}

prop_compose! {
    fn valid_profile_strategy()(
        credit_score in 350i64..=850,
        geography in geography_strategy(),
        gender in gender_strategy(),
        age in 18i64..=92,
        tenure in 0i64..=10,
        balance in 0.0f64..1_000_000.0,
        num_products in 1i64..=4,
        has_credit_card in proptest::bool::ANY,
        is_active_member in proptest::bool::ANY,
        estimated_salary in 0.0f64..1_000_000.0,
    ) -> CustomerProfile {
        CustomerProfile {
            credit_score,
            geography,
            gender,
            age,
            tenure,
            balance,
            num_products,
            has_credit_card,
            is_active_member,
            estimated_salary,
        }
    }
}

// Property: every in-range profile encodes, in the exact declared order
proptest! {
    #[test]
    fn valid_profiles_always_encode(profile in valid_profile_strategy()) {
        let vector = encoder::encode(&profile).unwrap();
        let arr = vector.as_array();

        // Positional order is fixed: pass-through fields land where trained
        prop_assert_eq!(arr[0], profile.credit_score as f64);
        prop_assert_eq!(arr[3], profile.age as f64);
        prop_assert_eq!(arr[4], profile.tenure as f64);
        prop_assert_eq!(arr[5], profile.balance);
        prop_assert_eq!(arr[6], profile.num_products as f64);
        prop_assert_eq!(arr[9], profile.estimated_salary);
    }

    #[test]
    fn geography_always_maps_to_exact_literal(profile in valid_profile_strategy()) {
        let vector = encoder::encode(&profile).unwrap();
        let expected = match profile.geography {
            Geography::France => GEOGRAPHY_FRANCE,
            Geography::Germany => GEOGRAPHY_GERMANY,
            Geography::Spain => GEOGRAPHY_SPAIN,
        };
        prop_assert_eq!(vector.geography, expected);
    }

    #[test]
    fn gender_and_flags_encode_to_unit_scalars(profile in valid_profile_strategy()) {
        let vector = encoder::encode(&profile).unwrap();
        prop_assert!(vector.gender == 0.0 || vector.gender == 1.0);
        prop_assert_eq!(vector.gender == 1.0, profile.gender == Gender::Female);
        prop_assert_eq!(vector.has_credit_card == 1.0, profile.has_credit_card);
        prop_assert_eq!(vector.is_active_member == 1.0, profile.is_active_member);
    }
}

// Property: out-of-range profiles fail closed, never panic
proptest! {
    #[test]
    fn out_of_range_credit_score_never_encodes(
        mut profile in valid_profile_strategy(),
        score in prop_oneof![-1000i64..350, 851i64..10_000],
    ) {
        profile.credit_score = score;
        prop_assert!(encoder::encode(&profile).is_err());
    }

    #[test]
    fn out_of_range_age_never_encodes(
        mut profile in valid_profile_strategy(),
        age in prop_oneof![-100i64..18, 93i64..1000],
    ) {
        profile.age = age;
        prop_assert!(encoder::encode(&profile).is_err());
    }

    #[test]
    fn negative_balance_never_encodes(
        mut profile in valid_profile_strategy(),
        balance in -1_000_000.0f64..-0.000001,
    ) {
        profile.balance = balance;
        prop_assert!(encoder::encode(&profile).is_err());
    }
}

// Property: prediction never panics and stays in bounds
proptest! {
    #[test]
    fn prediction_probability_always_in_confidence_range(
        profile in valid_profile_strategy(),
        weights in prop::collection::vec(-0.01f64..0.01, 10),
        intercept in -5.0f64..5.0,
    ) {
        let model = ChurnModel {
            model_id: "prop-test".to_string(),
            features: (0..10).map(|i| format!("f{}", i)).collect(),
            weights,
            intercept,
        };

        let vector = encoder::encode(&profile).unwrap();
        let prediction = model.predict(&vector).unwrap();

        prop_assert!(prediction.label == 0 || prediction.label == 1);
        // Confidence in the predicted label is always the majority side
        prop_assert!((0.5..=1.0).contains(&prediction.probability));
    }

    #[test]
    fn malformed_vectors_yield_errors_not_panics(
        nan_index in 0usize..10,
        weights in prop::collection::vec(-1.0f64..1.0, 10),
    ) {
        let model = ChurnModel {
            model_id: "prop-test".to_string(),
            features: (0..10).map(|i| format!("f{}", i)).collect(),
            weights,
            intercept: 0.0,
        };

        let mut arr = [1.0f64; 10];
        arr[nan_index] = f64::NAN;
        let vector = FeatureVector {
            credit_score: arr[0],
            geography: arr[1],
            gender: arr[2],
            age: arr[3],
            tenure: arr[4],
            balance: arr[5],
            num_products: arr[6],
            has_credit_card: arr[7],
            is_active_member: arr[8],
            estimated_salary: arr[9],
        };

        prop_assert!(model.predict(&vector).is_err());
    }
}

// Property: recording fingerprints are deterministic and collision-averse
// for distinct payloads of the sizes the dashboard produces
proptest! {
    #[test]
    fn fingerprints_deterministic(payload in prop::collection::vec(any::<u8>(), 0..2048)) {
        use churn_insight_api::session::recording_fingerprint;
        let a = recording_fingerprint(&payload);
        let b = recording_fingerprint(&payload);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn fingerprints_differ_for_extended_payloads(
        payload in prop::collection::vec(any::<u8>(), 1..1024),
        extra in any::<u8>(),
    ) {
        use churn_insight_api::session::recording_fingerprint;
        let mut extended = payload.clone();
        extended.push(extra);
        prop_assert_ne!(
            recording_fingerprint(&payload),
            recording_fingerprint(&extended)
        );
    }
}

use proptest::prelude::*;
use sepsis_triage::{GuardrailEngine, GuardrailProfile, SeverityClass};
use std::collections::HashMap;

fn profile() -> impl Strategy<Value = GuardrailProfile> {
    prop_oneof![Just(GuardrailProfile::Basic), Just(GuardrailProfile::Extended)]
}

fn class() -> impl Strategy<Value = SeverityClass> {
    (0usize..3).prop_map(|i| SeverityClass::from_index(i).unwrap())
}

fn vitals() -> impl Strategy<Value = HashMap<String, f64>> {
    (
        20.0f64..220.0,
        40.0f64..200.0,
        0.1f64..15.0,
        60.0f64..100.0,
        0.0f64..20.0,
        0.5f64..50.0,
        5.0f64..600.0,
    )
        .prop_map(|(hr, sbp, lactate, o2, sofa, wbc, platelets)| {
            HashMap::from([
                ("HR".to_string(), hr),
                ("SBP".to_string(), sbp),
                ("Lactate".to_string(), lactate),
                ("O2Sat".to_string(), o2),
                ("SOFA_score".to_string(), sofa),
                ("WBC".to_string(), wbc),
                ("Platelets".to_string(), platelets),
            ])
        })
}

proptest! {
    #[test]
    fn never_below_the_model(raw in class(), obs in vitals(), p in profile()) {
        let d = GuardrailEngine::new(p).evaluate(raw, |f| obs.get(f).copied());
        prop_assert!(d.final_class >= raw);
        if d.is_override {
            prop_assert_eq!(raw, SeverityClass::Healthy);
            prop_assert_eq!(d.final_class, SeverityClass::Severe);
            prop_assert!(d.reason.is_some());
        } else {
            prop_assert_eq!(d.final_class, raw);
        }
    }

    #[test]
    fn extended_fires_whenever_basic_does(obs in vitals()) {
        let basic = GuardrailEngine::new(GuardrailProfile::Basic)
            .evaluate(SeverityClass::Healthy, |f| obs.get(f).copied());
        let extended = GuardrailEngine::new(GuardrailProfile::Extended)
            .evaluate(SeverityClass::Healthy, |f| obs.get(f).copied());
        prop_assert!(!basic.is_override || extended.is_override);
    }
}

use proptest::prelude::*;

use crate::config::AnalyticsConfig;
use crate::lifecycle::models::fixtures::training_customers;
use crate::lifecycle::models::{LeadProfile, ModelSet};
use crate::model::Customer;

fn arb_metric() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![Just(None), (0.0f64..10_000.0).prop_map(Some)]
}

pub fn arb_customer() -> impl Strategy<Value = Customer> {
    (
        (any::<bool>(), any::<bool>(), any::<bool>()),
        (arb_metric(), arb_metric(), arb_metric(), arb_metric()),
        (arb_metric(), arb_metric(), arb_metric(), arb_metric()),
        (arb_metric(), arb_metric(), arb_metric(), arb_metric()),
    )
        .prop_map(
            |(
                (is_customer, churned, expansion),
                (tenure, logins, features, hours),
                (tickets, response, nps, renewals),
                (acv, ltv, size, cac),
            )| Customer {
                id: 1,
                email: "prop@example.com".to_string(),
                is_customer,
                churned,
                expansion,
                tenure_months: tenure,
                logins_per_month: logins,
                active_features_used: features,
                product_usage_hours: hours,
                tickets_raised: tickets,
                avg_support_response_hours: response,
                nps_score: nps,
                renewals_count: renewals,
                acv,
                ltv,
                company_size: size,
                cac,
                ..Customer::default()
            },
        )
}

pub fn arb_lead() -> impl Strategy<Value = LeadProfile> {
    let text = || prop::option::of("[A-Za-z ]{0,16}");
    (arb_metric(), text(), text(), text()).prop_map(
        |(company_size, industry, region, decision_maker_role)| LeadProfile {
            company_size,
            industry,
            region,
            decision_maker_role,
        },
    )
}

fn trained_models() -> ModelSet {
    let config = AnalyticsConfig::default();
    let mut models = ModelSet::new(&config);
    models.train_all(&training_customers(60), &config);
    models
}

proptest! {
    #[test]
    fn churn_probability_stays_in_unit_range(customer in arb_customer()) {
        let prediction = trained_models().churn.predict(&customer);
        prop_assert!((0.0..=1.0).contains(&prediction.churn_probability));
        prop_assert!((0.5..=1.0).contains(&prediction.prediction_confidence));
    }

    #[test]
    fn clv_is_finite_and_non_negative(customer in arb_customer()) {
        let estimate = trained_models().clv.calculate(&customer);
        prop_assert!(estimate.estimated_clv.is_finite());
        prop_assert!(estimate.estimated_clv >= 0.0);
    }

    #[test]
    fn lead_score_is_a_percentage(lead in arb_lead()) {
        let score = trained_models().lead_scorer.evaluate(&lead);
        prop_assert!((0.0..=100.0).contains(&score.lead_score));
        prop_assert_eq!(score.recommendations.len(), 2);
    }
}

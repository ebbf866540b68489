use super::engine::saturate;
use super::types::{MAX_PAYOUT_SCENARIOS, PayoutScenario};

// cycles closer than one currency unit count as settled
const CONVERGENCE_UNIT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmortizationConfig {
    pub initial_carried_cost: f64,
    pub payout_amount: f64,
    pub hedge_cost_per_payout: f64,
    pub funded_fail_gross: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayoutPlan {
    pub scenarios: Vec<PayoutScenario>,
    pub converged: bool,
}

impl PayoutPlan {
    pub fn first_profitable_payout(&self) -> Option<u32> {
        self.scenarios
            .iter()
            .find(|s| s.net_after_payout >= 0.0)
            .map(|s| s.payout_number)
    }
}

pub fn amortize_payouts(config: AmortizationConfig) -> PayoutPlan {
    let mut scenarios = Vec::with_capacity(MAX_PAYOUT_SCENARIOS);
    let mut carried_cost = config.initial_carried_cost;
    let mut previous: Option<PayoutScenario> = None;
    let mut converged = false;

    while scenarios.len() < MAX_PAYOUT_SCENARIOS {
        let total_cost = saturate(carried_cost + config.hedge_cost_per_payout);
        let scenario = PayoutScenario {
            payout_number: scenarios.len() as u32 + 1,
            total_cost,
            net_after_payout: saturate(config.payout_amount - total_cost),
            net_if_fail_after: saturate(config.funded_fail_gross - carried_cost),
        };
        scenarios.push(scenario);

        carried_cost = (-scenario.net_after_payout).max(0.0);

        if let Some(prev) = previous {
            let payout_settled = (scenario.net_after_payout - prev.net_after_payout).abs()
                < CONVERGENCE_UNIT
                && (scenario.net_if_fail_after - prev.net_if_fail_after).abs() < CONVERGENCE_UNIT;
            if payout_settled && carried_cost < CONVERGENCE_UNIT {
                converged = true;
                break;
            }
        }
        previous = Some(scenario);
    }

    PayoutPlan {
        scenarios,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn profitable_first_payout_settles_on_third_cycle() {
        let plan = amortize_payouts(AmortizationConfig {
            initial_carried_cost: 3_000.0,
            payout_amount: 4_000.0,
            hedge_cost_per_payout: 500.0,
            funded_fail_gross: 5_000.0,
        });

        assert!(plan.converged);
        assert_eq!(plan.scenarios.len(), 3);
        assert_eq!(plan.first_profitable_payout(), Some(1));

        let first = plan.scenarios[0];
        assert_eq!(first.payout_number, 1);
        assert_approx(first.total_cost, 3_500.0);
        assert_approx(first.net_after_payout, 500.0);
        assert_approx(first.net_if_fail_after, 2_000.0);

        let last = plan.scenarios[2];
        assert_eq!(last.payout_number, 3);
        assert_approx(last.total_cost, 500.0);
        assert_approx(last.net_after_payout, 3_500.0);
        assert_approx(last.net_if_fail_after, 5_000.0);
    }

    #[test]
    fn deficit_is_carried_into_the_next_cycle() {
        let plan = amortize_payouts(AmortizationConfig {
            initial_carried_cost: 3_000.0,
            payout_amount: 2_000.0,
            hedge_cost_per_payout: 500.0,
            funded_fail_gross: 4_000.0,
        });

        assert!(plan.converged);
        assert_eq!(plan.scenarios.len(), 4);

        let expected = [
            (3_500.0, -1_500.0, 1_000.0),
            (2_000.0, 0.0, 2_500.0),
            (500.0, 1_500.0, 4_000.0),
            (500.0, 1_500.0, 4_000.0),
        ];
        for (scenario, (total, net, fail)) in plan.scenarios.iter().zip(expected) {
            assert_approx(scenario.total_cost, total);
            assert_approx(scenario.net_after_payout, net);
            assert_approx(scenario.net_if_fail_after, fail);
        }
        assert_eq!(plan.first_profitable_payout(), Some(2));
    }

    #[test]
    fn payout_below_hedge_cost_stops_at_cap() {
        let plan = amortize_payouts(AmortizationConfig {
            initial_carried_cost: 1_000.0,
            payout_amount: 100.0,
            hedge_cost_per_payout: 500.0,
            funded_fail_gross: 2_000.0,
        });

        assert!(!plan.converged);
        assert_eq!(plan.scenarios.len(), MAX_PAYOUT_SCENARIOS);
        assert_eq!(plan.first_profitable_payout(), None);
        for pair in plan.scenarios.windows(2) {
            assert!(pair[1].net_after_payout <= pair[0].net_after_payout);
            assert_eq!(pair[1].payout_number, pair[0].payout_number + 1);
        }
        assert_eq!(plan.scenarios[9].payout_number, 10);
    }

    #[test]
    fn zero_everything_converges_after_two_cycles() {
        let plan = amortize_payouts(AmortizationConfig {
            initial_carried_cost: 0.0,
            payout_amount: 0.0,
            hedge_cost_per_payout: 0.0,
            funded_fail_gross: 0.0,
        });
        assert!(plan.converged);
        assert_eq!(plan.scenarios.len(), 2);
        assert_eq!(plan.first_profitable_payout(), Some(1));
    }

    #[test]
    fn overflowing_carried_cost_stays_finite() {
        let plan = amortize_payouts(AmortizationConfig {
            initial_carried_cost: f64::MAX,
            payout_amount: 4_000.0,
            hedge_cost_per_payout: f64::MAX / 2.0,
            funded_fail_gross: -f64::MAX,
        });

        assert!(!plan.converged);
        assert_eq!(plan.scenarios.len(), MAX_PAYOUT_SCENARIOS);
        for scenario in &plan.scenarios {
            assert_eq!(scenario.total_cost, f64::MAX);
            assert!(scenario.net_after_payout.is_finite());
            assert_eq!(scenario.net_if_fail_after, -f64::MAX);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_schedule_is_bounded_and_indexed_from_one(
            initial in 0u32..200_000,
            payout in 0u32..50_000,
            hedge_cost in 0u32..50_000,
            gross in 0u32..200_000
        ) {
            let plan = amortize_payouts(AmortizationConfig {
                initial_carried_cost: initial as f64,
                payout_amount: payout as f64,
                hedge_cost_per_payout: hedge_cost as f64,
                funded_fail_gross: gross as f64,
            });

            prop_assert!(!plan.scenarios.is_empty());
            prop_assert!(plan.scenarios.len() <= MAX_PAYOUT_SCENARIOS);
            for (idx, scenario) in plan.scenarios.iter().enumerate() {
                prop_assert!(scenario.payout_number as usize == idx + 1);
                prop_assert!(scenario.total_cost.is_finite());
                prop_assert!(scenario.net_after_payout.is_finite());
                prop_assert!(scenario.net_if_fail_after.is_finite());
                // both columns are charged the same carried cost
                let carried = scenario.total_cost - hedge_cost as f64;
                prop_assert!((gross as f64 - carried - scenario.net_if_fail_after).abs() < 1e-6);
            }
            if !plan.converged {
                prop_assert!(plan.scenarios.len() == MAX_PAYOUT_SCENARIOS);
            }
        }
    }
}

use sipswp::core::{
    ConfigError, GoalInputs, PlannerDefaults, ScenarioLabel, SimulationConfig,
    analyze_sequence_risk, build_survival_grid, future_value, reverse_goal, simulate,
};

#[test]
fn default_plan_runs_every_operation() {
    let defaults = PlannerDefaults::default();

    let ledger = simulate(&defaults.simulation).expect("default simulation is valid");
    assert_eq!(ledger.len(), 30);
    assert_eq!(ledger.years[0].monthly_contribution, Some(1_000.0));
    assert_eq!(ledger.years[10].monthly_withdrawal, Some(10_000.0));

    let outcome = reverse_goal(&defaults.goal).expect("default goal is valid");
    if let Some(step_up) = outcome.step_up_percent() {
        assert!((0.0..=100.0).contains(&step_up));
    }

    let scenarios = analyze_sequence_risk(&defaults.sequence).expect("default sequence is valid");
    for label in ScenarioLabel::ALL {
        assert_eq!(scenarios.scenario(label).balances.len(), 31);
    }

    let grid = build_survival_grid(&defaults.survival).expect("default survival is valid");
    assert_eq!(grid.cells().count(), 25);
}

#[test]
fn goal_step_up_feeds_back_into_contribution_only_simulation() {
    let inputs = GoalInputs {
        target: future_value(2_000.0, 15, 10.0, 12.0),
        initial_contribution: 2_000.0,
        years: 15,
        annual_return_percent: 10.0,
    };
    let step_up = reverse_goal(&inputs)
        .expect("valid inputs")
        .step_up_percent()
        .expect("achievable");
    assert!((step_up - 12.0).abs() <= 0.01, "step-up {step_up}");

    let ledger = simulate(&SimulationConfig::contribution_only(2_000.0, 15, 10.0, step_up))
        .expect("valid config");
    let gap = (ledger.final_balance() - inputs.target).abs() / inputs.target;
    assert!(gap < 1e-3, "relative gap {gap}");
    assert!(ledger.iter().all(|row| row.annual_withdrawal.is_none()));
}

#[test]
fn invalid_configuration_returns_no_partial_ledger() {
    let mut config = PlannerDefaults::default().simulation;
    config.contribution_years = 0;
    config.withdrawal_years = 0;
    assert_eq!(simulate(&config), Err(ConfigError::EmptyHorizon));
}

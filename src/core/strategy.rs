use super::types::{SimulationConfig, StrategyVariant};

/// Tracked portfolio value and amount paid in so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub value: f64,
    pub contribution: f64,
}

impl StrategyVariant {
    /// Month-0 state. Take-profit variants realise all gains up front and
    /// restart from the cost basis.
    pub fn initial_state(self, config: &SimulationConfig) -> PortfolioState {
        match self {
            StrategyVariant::ContinueContributing | StrategyVariant::StopContributing => {
                PortfolioState {
                    value: config.initial_value(),
                    contribution: config.principal,
                }
            }
            StrategyVariant::TakeProfitHold | StrategyVariant::TakeProfitContribute => {
                PortfolioState {
                    value: config.cost_basis(),
                    contribution: config.cost_basis(),
                }
            }
        }
    }

    /// Applies one month: contributing variants add `monthly_contribution`
    /// before the return is applied.
    pub fn step(
        self,
        state: PortfolioState,
        monthly_contribution: f64,
        monthly_return: f64,
    ) -> PortfolioState {
        match self {
            StrategyVariant::ContinueContributing | StrategyVariant::TakeProfitContribute => {
                PortfolioState {
                    value: (state.value + monthly_contribution) * (1.0 + monthly_return),
                    contribution: state.contribution + monthly_contribution,
                }
            }
            StrategyVariant::StopContributing | StrategyVariant::TakeProfitHold => {
                PortfolioState {
                    value: state.value * (1.0 + monthly_return),
                    contribution: state.contribution,
                }
            }
        }
    }

    pub fn contributes(self) -> bool {
        matches!(
            self,
            StrategyVariant::ContinueContributing | StrategyVariant::TakeProfitContribute
        )
    }

    pub fn takes_profit(self) -> bool {
        matches!(
            self,
            StrategyVariant::TakeProfitHold | StrategyVariant::TakeProfitContribute
        )
    }
}

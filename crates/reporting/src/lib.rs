//! Campaign analytics computed for the dashboard layer: ROAS/CAC creative
//! summaries, payback curves, and model-driven budget lift forecasts.

pub mod creative;
pub mod lift;
pub mod payback;

pub use creative::{creative_summary, CreativeSummary};
pub use lift::{average_order_value, forecast_lift, LiftForecast};
pub use payback::{payback_curve, PaybackCurve, PaybackPoint};

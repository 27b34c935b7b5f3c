//! Plain-text renderings of each screen.

pub mod history_view;
pub mod payment_view;
pub mod result_view;

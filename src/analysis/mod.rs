pub mod history;
pub mod recommendation;
pub mod risk;

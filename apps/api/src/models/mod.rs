pub mod provocation;
pub mod score;
pub mod thinker;

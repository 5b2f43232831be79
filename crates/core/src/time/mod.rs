mod day_boundary;

pub use day_boundary::DayBoundary;

//! glmstep: Logistic Regression Workflow Library
//!
//! Loads a tabular dataset, explores and standardizes it, splits it into
//! training and test rows, fits a logistic regression with k-fold
//! cross-validation, and supports guided backward elimination.

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;

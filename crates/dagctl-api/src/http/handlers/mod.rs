//! HTTP request handlers for the control API.

pub mod dag;
pub mod dag_run;
pub mod task;
pub mod xcom;

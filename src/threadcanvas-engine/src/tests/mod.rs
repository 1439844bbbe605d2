//! Pipeline and bot scenarios against in-memory Slack and model fakes.

pub(crate) mod support;

mod pipeline_tests;

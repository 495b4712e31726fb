// Post-generation delivery concerns: content sanitization, then the subject and
// signature envelope the caller wraps around it.

pub mod envelope;
pub mod sanitize;

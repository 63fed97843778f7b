//! Property-based tests for message passing.
//!
//! Uses proptest to check the algebraic laws the passes rely on: split and
//! fuse are inverse, domain inference is idempotent, and fused sets are
//! sound and tight when aligned.

//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the fake TMDB data changes, update only this file.

// ============================================================================
// Fake TMDB Titles
// ============================================================================

/// TMDB API key the fake provider accepts
pub const TMDB_API_KEY: &str = "e2e-test-key";

/// Movie "Inception"
pub const INCEPTION_ID: u64 = 27205;

/// Title of Inception in the primary language (zh-CN)
pub const INCEPTION_TITLE: &str = "盗梦空间";

/// Tagline of Inception in the secondary language (en-US)
pub const INCEPTION_TAGLINE_EN: &str = "Your mind is the scene of the crime.";

/// Series "Breaking Bad"
pub const BREAKING_BAD_ID: u64 = 1396;

/// Title of Breaking Bad in the primary language
pub const BREAKING_BAD_TITLE: &str = "绝命毒师";

/// A movie id the fake provider does not know
pub const MISSING_ID: u64 = 999_999;

/// A movie id the fake provider always fails with a 500
pub const BROKEN_ID: u64 = 500;

/// A search query the fake provider always fails with a 500
pub const BROKEN_QUERY: &str = "broken";

/// Image base URL used by the server under test
pub const IMAGE_BASE_URL: &str = "https://images.test/original";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for a server to be ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual requests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval while waiting for a server
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

//! Integration tests driving the MediaWiki client and coordinator against a mock wiki

mod crawl_tests;
mod discovery_tests;
mod support;

//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use serde_json::json;

/// HMAC secret shared by test codecs
pub const TEST_JWT_SECRET: &[u8] = b"integration-test-secret-key";

/// Password used for seeded admin and fixture accounts
pub const TEST_PASSWORD: &str = "hunter-two";

/// Seeded admin credentials
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Create a register/login request payload
pub fn credentials_payload(username: &str, password: &str) -> serde_json::Value {
    json!({
        "username": username,
        "password": password,
    })
}

/// Create a pet create/update payload
pub fn pet_payload(name: &str, kind: &str, age: i64) -> serde_json::Value {
    json!({
        "name": name,
        "kind": kind,
        "age": age,
    })
}

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a result is Err
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}

// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Test-only helper for spinning up a throwaway database per test.

#![cfg(test)]

use crate::store::Store;

pub async fn ephemeral_store() -> Store {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mimir.db");
    let url = format!("sqlite://{}", path.display());
    let store = Store::open(&url).await.expect("open store");
    // Leak the tempdir for the duration of the test process; each test gets
    // its own file and the OS cleans it up on exit.
    std::mem::forget(dir);
    store
}

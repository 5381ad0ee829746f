//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Request id generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generates request ids for request/reply correlation.
///
/// Ids start at 1 and increment monotonically; id 0 is reserved for
/// spontaneous server pushes. Generation is lock-free, so the generator
/// can be shared across any number of concurrent callers, and the `u64`
/// space cannot wrap within a session's lifetime.
///
/// # Example
///
/// ```rust
/// use argus_client::dispatch::RequestIdGenerator;
///
/// let generator = RequestIdGenerator::new();
/// let a = generator.next();
/// let b = generator.next();
/// assert!(a > 0);
/// assert_ne!(a, b);
/// ```
#[derive(Debug)]
pub struct RequestIdGenerator {
    next_id: AtomicU64,
}

impl RequestIdGenerator {
    /// Creates a generator starting at id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the next request id.
    #[must_use]
    pub fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

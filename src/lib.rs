//! LAPSE - Coherent Expiring Index Directory
//!
//! Tracks a bounded set of live entries, each stamped with its last-refresh
//! time, and evicts everything older than a cutoff in time proportional to
//! the number of entries evicted, while keeping the attached key lookup
//! structures exactly in sync. Built for flow tables in NAT/firewall style
//! network functions.
//!
//! ## Components
//! - **IndexDirectory**: O(1) allocate/refresh/free of small indices kept in
//!   oldest-to-newest order
//! - **DenseStore**: fixed-capacity slots addressed by those indices, with
//!   borrow/return checkout
//! - **KeyIndexMap**: `key -> index` hash map
//! - **TwoLevelKeyIndexMap**: one row reachable through two keys
//! - **Expiration**: `expire_single_map` / `expire_double_map`, O(k) for k
//!   expired entries
//! - **ExpiringMap / ExpiringDoubleMap**: ready-made tables doing the
//!   insert/refresh/remove path coherently
//! - **Metrics**: atomic counters for table activity
//!
//! ## Example
//! ```
//! use lapse::config::Config;
//! use lapse::engine::ExpiringMap;
//!
//! let config = Config::new(1024).with_expiration_time(30);
//! let mut flows = ExpiringMap::open(config).unwrap();
//!
//! flows.insert("10.0.0.1:80", 7u32, 0).unwrap();
//! flows.insert("10.0.0.2:80", 8u32, 5).unwrap();
//! flows.refresh("10.0.0.1:80", 20).unwrap();
//!
//! // Idle for more than 30 ticks at t=40: only the second flow.
//! assert_eq!(flows.expire(40), 1);
//! assert_eq!(flows.get("10.0.0.1:80"), Some(&7));
//! assert_eq!(flows.get("10.0.0.2:80"), None);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

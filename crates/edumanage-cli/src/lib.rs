//! # EduManage CLI
//!
//! Support code for the `edumanage-cli` binary: terminal rendering of policy
//! data and demo-data seeding.
//!
//! ## Usage
//!
//! ```ignore
//! use edumanage_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(5, 50); // 5 teachers, 50 students
//! seed_all(&pool, &profiles, config).await?;
//! ```

pub mod report;
pub mod seeder;

// Copyright 2026 MapSQL Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared (second-level) cache tests: transactional visibility, write
//! invalidation, eviction, and bypass paths

mod common;

use std::sync::Arc;

use common::{user_transaction, CollectingConsumer};
use mapsql::{
    CommandKind, Configuration, RowBounds, SqlNode, StatementDescriptor, Value,
};

fn cached_config() -> Arc<Configuration> {
    Configuration::builder("test")
        .shared_cache("user-cache", 64)
        .statement(
            StatementDescriptor::builder(
                "user.selectAll",
                CommandKind::Select,
                SqlNode::static_text("SELECT id, name FROM users"),
            )
            .cache_ref("user-cache"),
        )
        .statement(
            StatementDescriptor::builder(
                "user.selectById",
                CommandKind::Select,
                SqlNode::static_text("SELECT id, name FROM users WHERE id = #{id}"),
            )
            .cache_ref("user-cache"),
        )
        .statement(
            StatementDescriptor::builder(
                "user.selectNoCache",
                CommandKind::Select,
                SqlNode::static_text("SELECT id, name FROM users"),
            )
            .cache_ref("user-cache")
            .use_cache(false),
        )
        .statement(
            StatementDescriptor::builder(
                "user.deleteAll",
                CommandKind::Delete,
                SqlNode::static_text("DELETE FROM users"),
            )
            .cache_ref("user-cache"),
        )
        .statement(StatementDescriptor::builder(
            "user.updateName",
            CommandKind::Update,
            SqlNode::static_text("UPDATE users SET name = #{name} WHERE id = #{id}"),
        ))
        .build()
        .expect("config")
}

#[test]
fn test_commit_publishes_results_across_sessions() {
    let config = cached_config();

    let (tx, log1) = user_transaction();
    let mut s1 = config.open_session(tx);
    s1.select_list("user.selectAll", Value::Null).unwrap();
    s1.commit().unwrap();
    s1.close();
    assert_eq!(log1.lock().queries.len(), 1);

    let (tx, log2) = user_transaction();
    let mut s2 = config.open_session(tx);
    let rows = s2.select_list("user.selectAll", Value::Null).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(log2.lock().queries.len(), 0);
}

#[test]
fn test_staged_results_invisible_before_commit() {
    let config = cached_config();

    let (tx, _log1) = user_transaction();
    let mut s1 = config.open_session(tx);
    s1.select_list("user.selectAll", Value::Null).unwrap();

    // Nothing committed yet; a second session must hit the database.
    let (tx, log2) = user_transaction();
    let mut s2 = config.open_session(tx);
    s2.select_list("user.selectAll", Value::Null).unwrap();
    assert_eq!(log2.lock().queries.len(), 1);

    // A clean close publishes buffered entries.
    s1.close();
    s2.close();
    let (tx, log3) = user_transaction();
    let mut s3 = config.open_session(tx);
    s3.select_list("user.selectAll", Value::Null).unwrap();
    assert_eq!(log3.lock().queries.len(), 0);
}

#[test]
fn test_forced_rollback_discards_staged_results() {
    let config = cached_config();

    let (tx, _) = user_transaction();
    let mut s1 = config.open_session(tx);
    s1.select_list("user.selectAll", Value::Null).unwrap();
    // An uncommitted write forces rollback at close.
    s1.update(
        "user.updateName",
        mapsql::value_map! { "id" => 1, "name" => "x" },
    )
    .unwrap();
    s1.close();

    // The staged rows were discarded; only the null release marker for
    // the recorded miss reached the backing store.
    let cache = config.shared_cache("user-cache").unwrap();
    assert_eq!(cache.lock().len(), 1);

    let (tx, log2) = user_transaction();
    let mut s2 = config.open_session(tx);
    s2.select_list("user.selectAll", Value::Null).unwrap();
    assert_eq!(log2.lock().queries.len(), 1);
}

#[test]
fn test_invalidating_statement_flushes_shared_cache() {
    let config = cached_config();

    let (tx, _) = user_transaction();
    let mut s1 = config.open_session(tx);
    s1.select_list("user.selectAll", Value::Null).unwrap();
    s1.close();

    let (tx, log2) = user_transaction();
    let mut s2 = config.open_session(tx);
    s2.delete("user.deleteAll", Value::Null).unwrap();
    // The staged clear hides previously published entries.
    s2.select_list("user.selectAll", Value::Null).unwrap();
    assert_eq!(log2.lock().queries.len(), 1);
    s2.commit().unwrap();
    s2.close();

    // The clear reached the backing store; the fresh result was
    // published after it.
    let (tx, log3) = user_transaction();
    let mut s3 = config.open_session(tx);
    s3.select_list("user.selectAll", Value::Null).unwrap();
    assert_eq!(log3.lock().queries.len(), 0);
}

#[test]
fn test_use_cache_false_always_reads_database() {
    let config = cached_config();

    let (tx, _) = user_transaction();
    let mut s1 = config.open_session(tx);
    s1.select_list("user.selectNoCache", Value::Null).unwrap();
    s1.close();

    let (tx, log2) = user_transaction();
    let mut s2 = config.open_session(tx);
    s2.select_list("user.selectNoCache", Value::Null).unwrap();
    assert_eq!(log2.lock().queries.len(), 1);
}

#[test]
fn test_fifo_capacity_bounds_published_entries() {
    let config = Configuration::builder("test")
        .shared_cache("small", 1)
        .statement(
            StatementDescriptor::builder(
                "user.selectById",
                CommandKind::Select,
                SqlNode::static_text("SELECT id, name FROM users WHERE id = #{id}"),
            )
            .cache_ref("small"),
        )
        .build()
        .expect("config");

    let (tx, _) = user_transaction();
    let mut s1 = config.open_session(tx);
    s1.select_list("user.selectById", mapsql::value_map! { "id" => 1 })
        .unwrap();
    s1.select_list("user.selectById", mapsql::value_map! { "id" => 2 })
        .unwrap();
    s1.close();

    let cache = config.shared_cache("small").unwrap();
    assert_eq!(cache.lock().len(), 1);
}

#[test]
fn test_consumer_results_never_reach_shared_cache() {
    let config = cached_config();

    let (tx, _) = user_transaction();
    let mut s1 = config.open_session(tx);
    let mut consumer = CollectingConsumer::default();
    s1.select_each(
        "user.selectAll",
        Value::Null,
        RowBounds::DEFAULT,
        &mut consumer,
    )
    .unwrap();
    assert_eq!(consumer.rows.len(), 2);
    s1.close();

    let cache = config.shared_cache("user-cache").unwrap();
    assert!(cache.lock().is_empty());
}

#[test]
fn test_cache_disabled_skips_shared_layer() {
    let config = Configuration::builder("test")
        .cache_enabled(false)
        .shared_cache("user-cache", 64)
        .statement(
            StatementDescriptor::builder(
                "user.selectAll",
                CommandKind::Select,
                SqlNode::static_text("SELECT id, name FROM users"),
            )
            .cache_ref("user-cache"),
        )
        .build()
        .expect("config");

    let (tx, _) = user_transaction();
    let mut s1 = config.open_session(tx);
    s1.select_list("user.selectAll", Value::Null).unwrap();
    s1.close();

    let (tx, log2) = user_transaction();
    let mut s2 = config.open_session(tx);
    s2.select_list("user.selectAll", Value::Null).unwrap();
    assert_eq!(log2.lock().queries.len(), 1);
}

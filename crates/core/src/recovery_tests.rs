// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn chain_escalates_monotonically() {
    let chain = RecoveryLevel::CHAIN;
    assert_eq!(chain.len(), 4);
    for pair in chain.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    assert_eq!(chain[3], RecoveryLevel::Escalate);
}

#[test]
fn context_stripping_tightens_down_the_chain() {
    assert!(RecoveryLevel::Retry.keeps_artifacts());
    assert!(RecoveryLevel::Retry.keeps_history());
    assert!(RecoveryLevel::Fork.keeps_artifacts());
    assert!(!RecoveryLevel::Fork.keeps_history());
    assert!(!RecoveryLevel::Fresh.keeps_artifacts());
    assert!(!RecoveryLevel::Fresh.keeps_history());
}

#[test]
fn only_escalate_skips_the_agent() {
    for level in RecoveryLevel::CHAIN {
        assert_eq!(level.reruns_agent(), level != RecoveryLevel::Escalate);
    }
}

#[test]
fn levels_serialize_upper_case() {
    assert_eq!(
        serde_json::to_string(&RecoveryLevel::Fresh).unwrap(),
        "\"FRESH\""
    );
}

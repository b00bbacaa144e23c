//! 券生命周期 - 校验、一次性核销、会员列表、过期提醒

mod common;

use std::sync::Arc;

use common::*;
use shared::ErrorCode;
use shared::models::{Actor, NotificationKind, RefundOptions, VoucherListOptions};
use shared::util::now_millis;

#[tokio::test]
async fn test_unknown_code_is_not_found_for_lookup_and_validation() {
    let (env, _) = env().await;
    let vouchers = &env.state.vouchers;

    let err = vouchers.get_voucher_by_code("INVALID").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::VoucherNotFound);
    assert!(err.is_not_found());

    // Not a {valid: false} answer
    let err = vouchers.validate_voucher("INVALID").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::VoucherNotFound);
}

#[tokio::test]
async fn test_valid_voucher_and_case_insensitive_lookup() {
    let (env, _) = env().await;
    let (order, code) = voucher_order(&env.repo, 7, Some(now_millis() + days(10))).await;

    let validation = env
        .state
        .vouchers
        .validate_voucher(&format!("  {}  ", code.to_lowercase()))
        .await
        .unwrap();
    assert!(validation.valid);
    assert!(validation.reason.is_none());
    assert_eq!(validation.voucher.order.id, order.id);
    assert_eq!(validation.voucher.owner_id(), 7);
}

#[tokio::test]
async fn test_lowercase_voucher_code_is_stored_normalized() {
    let (env, _) = env().await;
    let order = OrderSeed::for_user(7)
        .with_items(vec![fulfillment_server::db::repository::NewOrderItem::voucher(
            "Brinde",
            " brinde-cafe7 ",
            None,
        )])
        .insert(&env.repo)
        .await;

    for lookup in ["BRINDE-CAFE7", "brinde-cafe7", "Brinde-Cafe7"] {
        let voucher = env.state.vouchers.get_voucher_by_code(lookup).await.unwrap();
        assert_eq!(voucher.code(), "BRINDE-CAFE7");
        assert_eq!(voucher.order.id, order.id);
    }
    env.state
        .vouchers
        .mark_voucher_as_used("brinde-cafe7", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_expired_voucher_is_invalid() {
    let (env, _) = env().await;
    let (_, code) = voucher_order(&env.repo, 7, Some(now_millis() - 1000)).await;

    let validation = env.state.vouchers.validate_voucher(&code).await.unwrap();
    assert!(!validation.valid);
    assert!(validation.reason.unwrap().contains("expirado"));
    assert!(validation.expired_at.is_some());

    let err = env
        .state
        .vouchers
        .mark_voucher_as_used(&code, Some(1))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::VoucherExpired);
    assert!(err.is_invalid_state());
}

#[tokio::test]
async fn test_voucher_of_cancelled_order_is_invalid() {
    let (env, _) = env().await;
    let (order, code) = voucher_order(&env.repo, 7, None).await;

    env.state
        .status_machine
        .cancel_order(order.id, "loja fechada", Actor::admin(1), RefundOptions::default())
        .await
        .unwrap();

    let validation = env.state.vouchers.validate_voucher(&code).await.unwrap();
    assert!(!validation.valid);
    assert!(validation.reason.unwrap().contains("cancelado"));

    let err = env
        .state
        .vouchers
        .mark_voucher_as_used(&code, Some(1))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderCancelled);
}

#[tokio::test]
async fn test_voucher_is_redeemed_exactly_once() {
    let (env, recorder) = env().await;
    let (_, code) = voucher_order(&env.repo, 7, None).await;

    let redeemed = env
        .state
        .vouchers
        .mark_voucher_as_used(&code, Some(99))
        .await
        .unwrap();
    assert!(redeemed.item.voucher_used);
    assert!(redeemed.item.voucher_used_at.is_some());
    assert_eq!(redeemed.item.voucher_used_by, Some(99));
    assert_eq!(recorder.count_of(NotificationKind::VoucherUsed), 1);

    for _ in 0..3 {
        let err = env
            .state
            .vouchers
            .mark_voucher_as_used(&code, Some(99))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::VoucherAlreadyUsed);
    }

    let validation = env.state.vouchers.validate_voucher(&code).await.unwrap();
    assert!(!validation.valid);
    assert!(validation.reason.unwrap().contains("utilizado"));
    assert_eq!(validation.used_at, redeemed.item.voucher_used_at);
    assert_eq!(recorder.count_of(NotificationKind::VoucherUsed), 1);
}

#[tokio::test]
async fn test_concurrent_redemptions_have_one_winner() {
    let (env, _) = env().await;
    let (_, code) = voucher_order(&env.repo, 7, None).await;

    let attempts = (0..8).map(|i| {
        let vouchers = env.state.vouchers.clone();
        let code = code.clone();
        tokio::spawn(async move { vouchers.mark_voucher_as_used(&code, Some(i)).await })
    });
    let results = futures::future::join_all(attempts).await;

    let mut winners = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e.code, ErrorCode::VoucherAlreadyUsed),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_redemption() {
    let env = env_with(Arc::new(FailingDispatcher)).await;
    let (_, code) = voucher_order(&env.repo, 7, None).await;

    let redeemed = env.state.vouchers.mark_voucher_as_used(&code, None).await;
    assert!(redeemed.is_ok());

    let voucher = env.state.vouchers.get_voucher_by_code(&code).await.unwrap();
    assert!(voucher.item.voucher_used);
    assert_eq!(voucher.item.voucher_used_by, None);
}

#[tokio::test]
async fn test_user_vouchers_default_to_active_only() {
    let (env, _) = env().await;
    let now = now_millis();
    let (_, used) = voucher_order(&env.repo, 7, None).await;
    env.state.vouchers.mark_voucher_as_used(&used, None).await.unwrap();

    let active = env
        .state
        .vouchers
        .get_user_vouchers(7, VoucherListOptions::default())
        .await
        .unwrap();
    assert!(active.is_empty(), "only used vouchers, nothing active");

    let (_, fresh) = voucher_order(&env.repo, 7, Some(now + days(5))).await;
    let (_, expired) = voucher_order(&env.repo, 7, Some(now - days(1))).await;
    let (_, _other_user) = voucher_order(&env.repo, 8, None).await;

    let active = env
        .state
        .vouchers
        .get_user_vouchers(7, VoucherListOptions::default())
        .await
        .unwrap();
    let codes: Vec<&str> = active.iter().map(|v| v.voucher.code()).collect();
    assert_eq!(codes, vec![fresh.as_str()]);
    assert!(!active[0].is_expired);

    let all = env
        .state
        .vouchers
        .get_user_vouchers(
            7,
            VoucherListOptions {
                include_used: true,
                include_expired: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    let flagged = all.iter().find(|v| v.voucher.code() == expired).unwrap();
    assert!(flagged.is_expired);

    let with_used = env
        .state
        .vouchers
        .get_user_vouchers(
            7,
            VoucherListOptions {
                include_used: true,
                include_expired: false,
            },
        )
        .await
        .unwrap();
    let codes: Vec<&str> = with_used.iter().map(|v| v.voucher.code()).collect();
    assert!(codes.contains(&used.as_str()));
    assert!(!codes.contains(&expired.as_str()));
}

#[tokio::test]
async fn test_expiring_soon_window() {
    let (env, _) = env().await;
    let now = now_millis();

    let (_, in_three_days) = voucher_order(&env.repo, 7, Some(now + days(3))).await;
    let (_, _next_month) = voucher_order(&env.repo, 7, Some(now + days(30))).await;
    let (_, _already_expired) = voucher_order(&env.repo, 7, Some(now - 1000)).await;
    let (_, _no_expiry) = voucher_order(&env.repo, 7, None).await;
    let (_, used_soon) = voucher_order(&env.repo, 7, Some(now + days(2))).await;
    env.state
        .vouchers
        .mark_voucher_as_used(&used_soon, None)
        .await
        .unwrap();
    let (cancelled, _) = voucher_order(&env.repo, 7, Some(now + days(4))).await;
    env.state
        .status_machine
        .cancel_order(cancelled.id, "desistência", Actor::member(7), RefundOptions::default())
        .await
        .unwrap();
    // Regular items never show up
    OrderSeed::for_user(7).insert(&env.repo).await;

    let soon = env.state.vouchers.get_vouchers_expiring_soon(7).await.unwrap();
    let codes: Vec<&str> = soon.iter().map(|v| v.code()).collect();
    assert_eq!(codes, vec![in_three_days.as_str()]);
    for v in &soon {
        assert!(v.item.is_voucher());
        assert!(!v.item.voucher_used);
    }
}

#[tokio::test]
async fn test_expiration_warnings() {
    let (env, recorder) = env().await;

    assert_eq!(env.state.vouchers.send_expiration_warnings().await.unwrap(), 0);
    assert!(recorder.sent().is_empty());

    let (_, code) = voucher_order(&env.repo, 7, Some(now_millis() + days(3))).await;
    assert_eq!(env.state.vouchers.send_expiration_warnings().await.unwrap(), 1);

    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].user_id, 7);
    assert_eq!(sent[0].kind, NotificationKind::VoucherExpiring);
    assert!(sent[0].title.contains("Expirando"));
    assert_eq!(sent[0].data["voucherCode"], code.as_str());
    assert_eq!(sent[0].data["daysRemaining"], 3);
}

#[tokio::test]
async fn test_expiration_warnings_survive_failing_dispatcher() {
    let env = env_with(Arc::new(FailingDispatcher)).await;
    voucher_order(&env.repo, 7, Some(now_millis() + days(1))).await;
    voucher_order(&env.repo, 8, Some(now_millis() + days(6))).await;

    assert_eq!(env.state.vouchers.send_expiration_warnings().await.unwrap(), 2);
}

#[tokio::test]
async fn test_order_vouchers_listing() {
    let (env, _) = env().await;
    let order = OrderSeed::for_user(7)
        .with_items(vec![
            fulfillment_server::db::repository::NewOrderItem::regular("Bolo", 1, money(1200)),
            fulfillment_server::db::repository::NewOrderItem::voucher("Brinde A", "BRINDE-A1", None),
            fulfillment_server::db::repository::NewOrderItem::voucher(
                "Brinde B",
                "BRINDE-B1",
                Some(now_millis() - 1),
            ),
        ])
        .insert(&env.repo)
        .await;

    let vouchers = env.state.vouchers.list_order_vouchers(order.id).await.unwrap();
    assert_eq!(vouchers.len(), 2);
    assert_eq!(vouchers[0].voucher.code(), "BRINDE-A1");
    assert!(!vouchers[0].is_expired);
    assert!(vouchers[1].is_expired);
}

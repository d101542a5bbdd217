//! Social graph state: optimistic follow toggling and counter consistency.

mod support;

use shutter::{FollowCounters, GatewayError, InteractionError, UserProfile};
use std::sync::Arc;
use support::{login, mock_client, MockGateway};

fn grace() -> UserProfile {
    UserProfile {
        id: "u2".to_string(),
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "grace@example.com".to_string(),
        profile_picture: None,
    }
}

#[tokio::test]
async fn test_follow_confirms_optimistic_counter() {
    let gateway = Arc::new(MockGateway::new());
    let (client, _temp) = mock_client(gateway.clone());
    login(&client).await;

    gateway.set_profile(grace());
    gateway.set_counters(FollowCounters {
        following: 3,
        followers: 10,
    });
    let profile = client.load_profile("u2").await.unwrap();
    assert!(!profile.is_following);
    assert_eq!(profile.counters.followers, 10);

    let following = client.toggle_follow("u2").await.unwrap();
    assert!(following);
    assert!(gateway.calls().contains(&"follow u2".to_string()));

    // Confirmed: counter adjusted and the identity's following set updated.
    let view = client.current_user().unwrap();
    assert!(view.is_following("u2"));
}

#[tokio::test]
async fn test_follow_conflict_rolls_back_flag_and_counter_together() {
    let gateway = Arc::new(MockGateway::new());
    let (client, _temp) = mock_client(gateway.clone());
    login(&client).await;

    gateway.set_profile(grace());
    gateway.set_counters(FollowCounters {
        following: 3,
        followers: 10,
    });
    client.load_profile("u2").await.unwrap();

    gateway.fail_next(
        "follow",
        GatewayError::Conflict("already following".to_string()),
    );
    let err = client.toggle_follow("u2").await.unwrap_err();
    assert!(matches!(
        err,
        InteractionError::Gateway(GatewayError::Conflict(_))
    ));

    // Rolled back to (10, false); never out of sync.
    let view = client.profile_view("u2").unwrap();
    assert_eq!(view.counters.followers, 10);
    assert!(!view.is_following);
    assert!(!client.current_user().unwrap().is_following("u2"));
}

#[tokio::test]
async fn test_self_follow_rejected_without_network() {
    let gateway = Arc::new(MockGateway::new());
    let (client, _temp) = mock_client(gateway.clone());
    login(&client).await;
    let calls_before = gateway.calls().len();

    let err = client.toggle_follow("u1").await.unwrap_err();
    assert!(matches!(err, InteractionError::InvalidInput(_)));
    assert_eq!(gateway.calls().len(), calls_before);
}

#[tokio::test]
async fn test_unfollow_decrements_and_updates_identity() {
    let gateway = Arc::new(MockGateway::new());
    gateway.set_following(&["u2"]);
    let (client, _temp) = mock_client(gateway.clone());
    login(&client).await;

    gateway.set_profile(grace());
    gateway.set_counters(FollowCounters {
        following: 3,
        followers: 10,
    });
    let profile = client.load_profile("u2").await.unwrap();
    assert!(profile.is_following);

    let following = client.toggle_follow("u2").await.unwrap();
    assert!(!following);
    assert!(gateway.calls().contains(&"unfollow u2".to_string()));

    let view = client.profile_view("u2").unwrap();
    assert_eq!(view.counters.followers, 9);
    assert!(!view.is_following);
    assert!(!client.current_user().unwrap().is_following("u2"));
}

#[tokio::test]
async fn test_second_follow_while_pending_is_busy() {
    let gateway = Arc::new(MockGateway::new());
    let (client, _temp) = mock_client(gateway.clone());
    login(&client).await;

    gateway.set_profile(grace());
    gateway.set_counters(FollowCounters {
        following: 0,
        followers: 10,
    });
    client.load_profile("u2").await.unwrap();

    let gate = gateway.hold_next();
    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.toggle_follow("u2").await })
    };
    tokio::task::yield_now().await;

    let err = client.toggle_follow("u2").await.unwrap_err();
    assert!(matches!(err, InteractionError::Busy));

    gate.notify_one();
    assert!(in_flight.await.unwrap().unwrap());
    let view = client.profile_view("u2").unwrap();
    assert_eq!(view.counters.followers, 11);
    assert!(view.is_following);
}

#[tokio::test]
async fn test_follow_before_profile_load_is_not_loaded() {
    let gateway = Arc::new(MockGateway::new());
    let (client, _temp) = mock_client(gateway.clone());
    login(&client).await;

    let err = client.toggle_follow("u2").await.unwrap_err();
    assert!(matches!(err, InteractionError::NotLoaded(_)));
}

#[tokio::test]
async fn test_follow_while_logged_out_is_unauthorized() {
    let gateway = Arc::new(MockGateway::new());
    let (client, _temp) = mock_client(gateway.clone());

    let err = client.toggle_follow("u2").await.unwrap_err();
    assert!(matches!(
        err,
        InteractionError::Gateway(GatewayError::Unauthorized(_))
    ));
}

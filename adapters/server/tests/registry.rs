use std::{sync::Arc, time::Duration};

use rampart_core::{Phase, PlayerId, RoomError};
use rampart_server::{
    ChannelBroadcaster, ClientIntent, Outbound, Recipient, RoomRegistry, ServerConfig,
    ServerMessage,
};
use tokio::{sync::mpsc::UnboundedReceiver, time::sleep};

fn registry() -> (RoomRegistry, UnboundedReceiver<Outbound>) {
    let (broadcaster, outbound) = ChannelBroadcaster::new();
    let registry = RoomRegistry::new(&ServerConfig::default(), Arc::new(broadcaster));
    (registry, outbound)
}

/// Lets room actors catch up, then collects everything they sent.
async fn drain(outbound: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    sleep(Duration::from_millis(1)).await;
    let mut messages = Vec::new();
    while let Ok(message) = outbound.try_recv() {
        messages.push(message);
    }
    messages
}

fn errors_for(messages: &[Outbound], player: PlayerId) -> Vec<RoomError> {
    messages
        .iter()
        .filter(|outbound| outbound.to == Recipient::Player(player))
        .filter_map(|outbound| match &outbound.message {
            ServerMessage::ErrorMessage { error, .. } => Some(*error),
            _ => None,
        })
        .collect()
}

fn last_host(messages: &[Outbound]) -> Option<Option<PlayerId>> {
    messages
        .iter()
        .rev()
        .find_map(|outbound| match &outbound.message {
            ServerMessage::RoomState { host, .. } => Some(*host),
            _ => None,
        })
}

#[tokio::test(start_paused = true)]
async fn creating_a_room_acknowledges_the_host() {
    let (registry, mut outbound) = registry();
    let host = PlayerId::new(1);

    let code = registry
        .create_room(host, "host".to_owned())
        .await
        .expect("room created");

    assert_eq!(registry.room_count(), 1);
    assert_eq!(registry.room_of(host), Some(code.clone()));
    let messages = drain(&mut outbound).await;
    assert!(messages.contains(&Outbound {
        to: Recipient::Player(host),
        message: ServerMessage::RoomJoined {
            room_id: code.clone(),
        },
    }));
    assert_eq!(last_host(&messages), Some(Some(host)));
}

#[tokio::test(start_paused = true)]
async fn joining_an_unknown_room_reports_only_to_the_requester() {
    let (registry, mut outbound) = registry();
    let stranger = PlayerId::new(9);

    registry
        .dispatch(
            stranger,
            ClientIntent::JoinRoom {
                room_id: "ZZZZ".to_owned(),
                name: "lost".to_owned(),
            },
        )
        .await;

    let messages = drain(&mut outbound).await;
    assert_eq!(
        messages,
        vec![Outbound {
            to: Recipient::Player(stranger),
            message: ServerMessage::error(RoomError::RoomNotFound),
        }]
    );
    assert_eq!(registry.room_count(), 0);
    assert_eq!(registry.room_of(stranger), None);
}

#[tokio::test(start_paused = true)]
async fn fifth_player_is_turned_away() {
    let (registry, mut outbound) = registry();
    let code = registry
        .create_room(PlayerId::new(1), "p1".to_owned())
        .await
        .expect("room created");
    for id in 2..=4 {
        registry
            .join_room(&code, PlayerId::new(id), format!("p{id}"))
            .await
            .expect("seat available");
    }

    let late = PlayerId::new(5);
    let refused = registry.join_room(&code, late, "p5".to_owned()).await;

    assert_eq!(refused, Err(RoomError::RoomFull));
    assert_eq!(registry.room_of(late), None);
    let messages = drain(&mut outbound).await;
    assert!(!messages.iter().any(|outbound| outbound.to == Recipient::Player(late)));
}

#[tokio::test(start_paused = true)]
async fn refused_join_keeps_the_current_seat() {
    let (registry, _outbound) = registry();
    let wanderer = PlayerId::new(2);
    let home = registry
        .create_room(wanderer, "wanderer".to_owned())
        .await
        .expect("room created");
    let full = registry
        .create_room(PlayerId::new(10), "p10".to_owned())
        .await
        .expect("room created");
    for id in 11..=13 {
        registry
            .join_room(&full, PlayerId::new(id), format!("p{id}"))
            .await
            .expect("seat available");
    }

    let refused = registry
        .join_room(&full, wanderer, "wanderer".to_owned())
        .await;

    assert_eq!(refused, Err(RoomError::RoomFull));
    assert_eq!(registry.room_of(wanderer), Some(home));
    assert_eq!(registry.room_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn switching_rooms_closes_the_room_left_empty() {
    let (registry, _outbound) = registry();
    let wanderer = PlayerId::new(2);
    let _ = registry
        .create_room(wanderer, "wanderer".to_owned())
        .await
        .expect("room created");
    let target = registry
        .create_room(PlayerId::new(10), "p10".to_owned())
        .await
        .expect("room created");

    registry
        .join_room(&target, wanderer, "wanderer".to_owned())
        .await
        .expect("joined");

    assert_eq!(registry.room_of(wanderer), Some(target));
    assert_eq!(registry.room_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn host_leaving_promotes_the_next_player_and_last_leave_closes_the_room() {
    let (registry, mut outbound) = registry();
    let first = PlayerId::new(1);
    let second = PlayerId::new(2);
    let code = registry
        .create_room(first, "first".to_owned())
        .await
        .expect("room created");
    registry
        .join_room(&code, second, "second".to_owned())
        .await
        .expect("joined");
    let _ = drain(&mut outbound).await;

    registry.leave(first).await;
    let messages = drain(&mut outbound).await;
    assert_eq!(last_host(&messages), Some(Some(second)));
    assert_eq!(registry.room_count(), 1);

    registry.leave(second).await;
    assert_eq!(registry.room_count(), 0);
    assert_eq!(registry.room_of(second), None);
}

#[tokio::test(start_paused = true)]
async fn joining_the_current_room_again_changes_nothing() {
    let (registry, mut outbound) = registry();
    let host = PlayerId::new(1);
    let code = registry
        .create_room(host, "host".to_owned())
        .await
        .expect("room created");
    let _ = drain(&mut outbound).await;

    registry
        .join_room(&code, host, "host".to_owned())
        .await
        .expect("already seated");

    assert!(drain(&mut outbound).await.is_empty());
    assert_eq!(registry.room_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn creating_a_second_room_leaves_the_first() {
    let (registry, _outbound) = registry();
    let host = PlayerId::new(1);
    let first = registry
        .create_room(host, "host".to_owned())
        .await
        .expect("room created");
    let second = registry
        .create_room(host, "host".to_owned())
        .await
        .expect("room created");

    assert_ne!(first, second);
    assert_eq!(registry.room_count(), 1);
    assert_eq!(registry.room_of(host), Some(second));
}

#[tokio::test(start_paused = true)]
async fn started_game_unfreezes_after_the_grace_window() {
    let (registry, mut outbound) = registry();
    let host = PlayerId::new(1);
    let _ = registry
        .create_room(host, "host".to_owned())
        .await
        .expect("room created");
    registry
        .dispatch(host, ClientIntent::PlayerReady { ready: true })
        .await;
    let _ = drain(&mut outbound).await;

    registry.dispatch(host, ClientIntent::StartGame).await;
    let started = drain(&mut outbound).await;
    let kinds: Vec<&ServerMessage> = started.iter().map(|outbound| &outbound.message).collect();
    assert!(kinds.contains(&&ServerMessage::GameStarted { wave: 1 }));
    assert!(kinds.contains(&&ServerMessage::WaveUpdated { wave: 1 }));
    assert!(kinds.iter().any(|message| matches!(
        message,
        ServerMessage::RoomState {
            phase: Phase::Spawning,
            running: true,
            ..
        }
    )));

    sleep(Duration::from_millis(2500)).await;
    let resumed = drain(&mut outbound).await;
    assert!(resumed.iter().any(|outbound| matches!(
        outbound.message,
        ServerMessage::RoomState {
            phase: Phase::Combat,
            ..
        }
    )));
    assert!(resumed
        .iter()
        .any(|outbound| matches!(outbound.message, ServerMessage::EnemiesUpdated { .. })));
}

fn last_enemy_count(messages: &[Outbound]) -> Option<usize> {
    messages
        .iter()
        .rev()
        .find_map(|outbound| match &outbound.message {
            ServerMessage::EnemiesUpdated { enemies } => Some(enemies.len()),
            _ => None,
        })
}

#[tokio::test(start_paused = true)]
async fn first_wave_survives_a_long_lobby_wait() {
    let (registry, mut outbound) = registry();
    let host = PlayerId::new(1);
    let _ = registry
        .create_room(host, "host".to_owned())
        .await
        .expect("room created");
    registry
        .dispatch(host, ClientIntent::PlayerReady { ready: true })
        .await;
    sleep(Duration::from_secs(31)).await;
    let _ = drain(&mut outbound).await;

    registry.dispatch(host, ClientIntent::StartGame).await;
    let started = drain(&mut outbound).await;
    assert_eq!(last_enemy_count(&started), Some(2));

    sleep(Duration::from_millis(150)).await;
    let ticked = drain(&mut outbound).await;
    assert_eq!(last_enemy_count(&ticked), Some(2));
}

#[tokio::test(start_paused = true)]
async fn movement_is_echoed_to_everyone_but_the_mover() {
    let (registry, mut outbound) = registry();
    let host = PlayerId::new(1);
    let code = registry
        .create_room(host, "host".to_owned())
        .await
        .expect("room created");
    registry
        .dispatch(host, ClientIntent::PlayerReady { ready: true })
        .await;
    registry.dispatch(host, ClientIntent::StartGame).await;
    let _ = drain(&mut outbound).await;

    registry
        .dispatch(host, ClientIntent::PlayerMovement { x: 120.0, y: 80.0 })
        .await;

    let messages = drain(&mut outbound).await;
    let echoes: Vec<&Outbound> = messages
        .iter()
        .filter(|outbound| matches!(outbound.message, ServerMessage::PlayerMoved { .. }))
        .collect();
    assert_eq!(
        echoes,
        vec![&Outbound {
            to: Recipient::RoomExcept {
                room: code,
                except: host,
            },
            message: ServerMessage::PlayerMoved {
                id: host,
                x: 120.0,
                y: 80.0,
            },
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn only_the_host_may_start() {
    let (registry, mut outbound) = registry();
    let host = PlayerId::new(1);
    let guest = PlayerId::new(2);
    let code = registry
        .create_room(host, "host".to_owned())
        .await
        .expect("room created");
    registry
        .join_room(&code, guest, "guest".to_owned())
        .await
        .expect("joined");
    let _ = drain(&mut outbound).await;

    registry.dispatch(guest, ClientIntent::StartGame).await;

    let messages = drain(&mut outbound).await;
    assert_eq!(errors_for(&messages, guest), vec![RoomError::NotHost]);
    assert!(errors_for(&messages, host).is_empty());
    assert!(!messages
        .iter()
        .any(|outbound| matches!(outbound.message, ServerMessage::GameStarted { .. })));
}

#[tokio::test(start_paused = true)]
async fn intents_outside_a_room_are_rejected() {
    let (registry, mut outbound) = registry();
    let loner = PlayerId::new(4);

    registry
        .dispatch(loner, ClientIntent::PlayerReady { ready: true })
        .await;

    let messages = drain(&mut outbound).await;
    assert_eq!(errors_for(&messages, loner), vec![RoomError::RoomNotFound]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_every_room() {
    let (registry, _outbound) = registry();
    for id in 1..=3 {
        let _ = registry
            .create_room(PlayerId::new(id), format!("p{id}"))
            .await
            .expect("room created");
    }
    assert_eq!(registry.room_count(), 3);

    registry.shutdown().await;

    assert_eq!(registry.room_count(), 0);
    assert_eq!(registry.room_of(PlayerId::new(1)), None);
}

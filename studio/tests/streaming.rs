use std::time::Duration;

use studio::{Role, Script, StreamEvent, StreamState, Studio, StudioConfig, StudioError};

const SCRIPT: &str = r#"
fallback = "Sorry, I can only discuss the sample agreements."

[[response]]
triggers = ["termination"]
content = "Either party may terminate on **30 days** notice [MSA §4]¹."

[[response.citations]]
id = "1"
documentId = "msa"
documentTitle = "Master Services Agreement"
section = "§4"
excerpt = "Either party may terminate this Agreement upon thirty days written notice."

[[response]]
triggers = ["renewal", "renew"]
content = "The agreement renews automatically each year."
"#;

fn studio() -> Studio {
    let script = Script::from_toml(SCRIPT).expect("valid script");
    Studio::new(script, StudioConfig::default())
}

async fn content_of(studio: &Studio, id: studio::MessageId) -> String {
    studio.message(id).await.expect("message exists").content
}

#[tokio::test(start_paused = true)]
async fn reply_streams_to_full_content() {
    let studio = studio();
    let reply = studio.send("What about termination?").await.unwrap();

    assert_eq!(
        studio.stream_state().await,
        StreamState::Streaming { message_id: reply }
    );
    assert_eq!(content_of(&studio, reply).await, "");

    studio.wait_idle().await;

    let message = studio.message(reply).await.unwrap();
    assert_eq!(
        message.content,
        "Either party may terminate on **30 days** notice [MSA §4]¹."
    );
    assert!(!message.streaming);
    assert_eq!(message.citations.len(), 1);
    assert_eq!(studio.stream_state().await, StreamState::Done { message_id: reply });
    assert_eq!(studio.active_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn words_arrive_one_per_interval() {
    let studio = studio();
    let reply = studio.send("renewal terms").await.unwrap();

    tokio::time::sleep(Duration::from_millis(65)).await;
    assert_eq!(content_of(&studio, reply).await, "The agreement ");

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(content_of(&studio, reply).await, "The agreement renews ");
}

#[tokio::test(start_paused = true)]
async fn new_message_cancels_previous_stream() {
    let studio = studio();
    let first = studio.send("termination?").await.unwrap();
    tokio::time::sleep(Duration::from_millis(95)).await;

    let second = studio.send("and renewal?").await.unwrap();
    let frozen = content_of(&studio, first).await;
    assert_eq!(frozen, "Either party may ");

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(studio.active_streams(), 1);

    studio.wait_idle().await;
    assert_eq!(content_of(&studio, first).await, frozen);
    assert!(!studio.message(first).await.unwrap().streaming);
    assert_eq!(
        content_of(&studio, second).await,
        "The agreement renews automatically each year."
    );
    assert_eq!(studio.active_streams(), 0);

    let roles: Vec<Role> = studio.messages().await.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test(start_paused = true)]
async fn switching_conversation_cancels_stream() {
    let studio = studio();
    let original = studio.current_conversation().await;
    let reply = studio.send("termination").await.unwrap();
    let mut events = studio.subscribe();

    tokio::time::sleep(Duration::from_millis(35)).await;
    let fresh = studio.new_conversation("Second").await;
    let frozen = content_of(&studio, reply).await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(content_of(&studio, reply).await, frozen);
    assert_eq!(studio.stream_state().await, StreamState::Idle);
    assert_eq!(studio.current_conversation().await, fresh);
    assert!(studio.messages().await.is_empty());

    let mut saw_cancel = false;
    while let Ok(event) = events.try_recv() {
        if event == (StreamEvent::Cancelled { message_id: reply }) {
            saw_cancel = true;
        }
    }
    assert!(saw_cancel);

    studio.switch_conversation(original).await.unwrap();
    assert_eq!(studio.messages().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn fallback_and_errors() {
    let studio = studio();
    let reply = studio.send("hello").await.unwrap();
    studio.wait_idle().await;
    assert_eq!(
        content_of(&studio, reply).await,
        "Sorry, I can only discuss the sample agreements."
    );

    assert!(matches!(
        studio.send("   ").await,
        Err(StudioError::EmptyMessage)
    ));
    assert!(matches!(
        studio.switch_conversation(studio::ConversationId(99)).await,
        Err(StudioError::UnknownConversation(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn explicit_cancel_keeps_partial_reply() {
    let studio = studio();
    let reply = studio.send("termination").await.unwrap();
    tokio::time::sleep(Duration::from_millis(35)).await;
    studio.cancel().await;
    assert_eq!(studio.stream_state().await, StreamState::Idle);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(content_of(&studio, reply).await, "Either ");
    assert_eq!(studio.active_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_every_chunk_then_finished() {
    let studio = studio();
    let mut events = studio.subscribe();
    let reply = studio.send("renew?").await.unwrap();
    studio.wait_idle().await;

    let mut text = String::new();
    loop {
        match events.recv().await.unwrap() {
            StreamEvent::Chunk { message_id, text: chunk } => {
                assert_eq!(message_id, reply);
                text.push_str(&chunk);
            }
            StreamEvent::Finished { message_id } => {
                assert_eq!(message_id, reply);
                break;
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(text, "The agreement renews automatically each year.");
}

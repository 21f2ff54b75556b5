//! End-to-end GraphQL tests over an in-memory database
//!
//! Covers channel derived fields, blocking, message create/delete, push
//! fan-out and the user subscriptions.

mod common;

use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{Harness, error_code};
use hubbub::services::i18n::Locale;

// ============================================================================
// Channel fields
// ============================================================================

#[tokio::test]
async fn last_message_is_newest_live_message() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let channel = h.channel(&alice, &[&bob]).await;

    let query = "query($id: String!) { channel(id: $id) { lastMessageId lastMessage { id text } } }";

    let data = h.ok(Some(&alice), query, json!({ "id": channel })).await;
    assert_eq!(data["channel"]["lastMessage"], serde_json::Value::Null);

    let _m1 = h.say(&alice, &channel, "one").await;
    let m2 = h.say(&bob, &channel, "two").await;
    let m3 = h.say(&alice, &channel, "three").await;

    let data = h.ok(Some(&alice), query, json!({ "id": channel })).await;
    assert_eq!(data["channel"]["lastMessage"]["id"], json!(m3));
    assert_eq!(data["channel"]["lastMessageId"], json!(m3));

    h.ok(
        Some(&alice),
        "mutation($id: String!) { deleteMessage(id: $id) { id } }",
        json!({ "id": m3 }),
    )
    .await;

    let data = h.ok(Some(&alice), query, json!({ "id": channel })).await;
    assert_eq!(data["channel"]["lastMessage"]["id"], json!(m2));
    assert_eq!(data["channel"]["lastMessageId"], json!(m2));
}

#[tokio::test]
async fn messages_hide_blocked_senders() {
    let h = Harness::new().await;
    let u1 = h.user("u1").await;
    let u2 = h.user("u2").await;
    let u3 = h.user("u3").await;
    let channel = h.channel(&u1, &[&u2, &u3]).await;

    h.say(&u1, &channel, "from u1").await;
    h.say(&u2, &channel, "from u2").await;
    h.say(&u3, &channel, "from u3").await;
    h.say(&u2, &channel, "again u2").await;

    h.ok(
        Some(&u1),
        "mutation($id: String!) { blockUser(userId: $id) }",
        json!({ "id": u2.id() }),
    )
    .await;

    let query = "query($id: String!) { channel(id: $id) { messages { edges { node { senderId text } } } } }";

    let data = h.ok(Some(&u1), query, json!({ "id": channel })).await;
    let senders: Vec<&str> = data["channel"]["messages"]["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["node"]["senderId"].as_str().unwrap())
        .collect();
    assert_eq!(senders, vec![u1.id(), u3.id()]);

    // the block only applies to the user who made it
    let data = h.ok(Some(&u3), query, json!({ "id": channel })).await;
    assert_eq!(data["channel"]["messages"]["edges"].as_array().unwrap().len(), 4);

    // and is re-read on every request
    h.ok(
        Some(&u1),
        "mutation($id: String!) { unblockUser(userId: $id) }",
        json!({ "id": u2.id() }),
    )
    .await;
    let data = h.ok(Some(&u1), query, json!({ "id": channel })).await;
    assert_eq!(data["channel"]["messages"]["edges"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn messages_page_forward_and_backward() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let channel = h.channel(&alice, &[]).await;

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(h.say(&alice, &channel, &format!("m{}", i)).await);
    }

    let query = r#"
        query($id: String!, $first: Int, $after: String, $last: Int, $before: String) {
            channel(id: $id) {
                messages(first: $first, after: $after, last: $last, before: $before) {
                    edges { node { id } }
                    pageInfo { hasNextPage hasPreviousPage startCursor endCursor }
                }
            }
        }
    "#;
    let page_ids = |data: &serde_json::Value| -> Vec<String> {
        data["channel"]["messages"]["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["node"]["id"].as_str().unwrap().to_string())
            .collect()
    };

    let data = h.ok(Some(&alice), query, json!({ "id": channel, "first": 2 })).await;
    assert_eq!(page_ids(&data), ids[0..2].to_vec());
    let info = &data["channel"]["messages"]["pageInfo"];
    assert_eq!(info["hasNextPage"], json!(true));
    assert_eq!(info["hasPreviousPage"], json!(false));

    let end = info["endCursor"].as_str().unwrap().to_string();
    let data = h
        .ok(Some(&alice), query, json!({ "id": channel, "first": 10, "after": end }))
        .await;
    assert_eq!(page_ids(&data), ids[2..5].to_vec());
    let info = &data["channel"]["messages"]["pageInfo"];
    assert_eq!(info["hasNextPage"], json!(false));
    assert_eq!(info["hasPreviousPage"], json!(true));

    let data = h.ok(Some(&alice), query, json!({ "id": channel, "last": 2 })).await;
    assert_eq!(page_ids(&data), ids[3..5].to_vec());
    let info = &data["channel"]["messages"]["pageInfo"];
    assert_eq!(info["hasPreviousPage"], json!(true));

    let start = info["startCursor"].as_str().unwrap().to_string();
    let data = h
        .ok(Some(&alice), query, json!({ "id": channel, "last": 2, "before": start }))
        .await;
    assert_eq!(page_ids(&data), ids[1..3].to_vec());

    let resp = h
        .execute(Some(&alice), query, json!({ "id": channel, "after": "%%%" }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("BAD_USER_INPUT"));

    let resp = h
        .execute(Some(&alice), query, json!({ "id": channel, "first": 1, "last": 1 }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("BAD_USER_INPUT"));

    // a cursor taken from another channel's listing
    let other = h.channel(&alice, &[]).await;
    h.say(&alice, &other, "elsewhere").await;
    let data = h.ok(Some(&alice), query, json!({ "id": other, "first": 1 })).await;
    let foreign = data["channel"]["messages"]["pageInfo"]["endCursor"]
        .as_str()
        .unwrap()
        .to_string();
    let resp = h
        .execute(Some(&alice), query, json!({ "id": channel, "after": foreign }))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("BAD_USER_INPUT"));
}

#[tokio::test]
async fn memberships_exclude_me() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let carol = h.user("carol").await;
    let channel = h.channel(&alice, &[&bob, &carol]).await;

    let query = r#"
        query($id: String!, $excludeMe: Boolean) {
            channel(id: $id) { memberships(excludeMe: $excludeMe) { userId membershipType user { name } } }
        }
    "#;
    let user_ids = |data: &serde_json::Value| -> Vec<String> {
        let mut ids: Vec<String> = data["channel"]["memberships"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["userId"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        ids
    };

    let data = h.ok(Some(&bob), query, json!({ "id": channel, "excludeMe": true })).await;
    let ids = user_ids(&data);
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&bob.id().to_string()));

    let data = h.ok(Some(&bob), query, json!({ "id": channel, "excludeMe": false })).await;
    assert!(user_ids(&data).contains(&bob.id().to_string()));

    let data = h.ok(Some(&bob), query, json!({ "id": channel })).await;
    assert_eq!(user_ids(&data).len(), 3);

    let owner = data["channel"]["memberships"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["membershipType"] == json!("OWNER"))
        .unwrap();
    assert_eq!(owner["userId"], json!(alice.id()));
    assert_eq!(owner["user"]["name"], json!("alice"));
}

// ============================================================================
// Message mutations
// ============================================================================

#[tokio::test]
async fn create_message_moves_pointer_and_delete_is_soft() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let channel = h.channel(&alice, &[]).await;

    let data = h
        .ok(
            Some(&alice),
            r#"mutation($c: String!) {
                createMessage(channelId: $c, message: { messageType: PHOTO, imageUrls: ["http://x/a.png"] }) {
                    id senderId messageType imageUrls fileUrls deletedAt sender { name }
                }
            }"#,
            json!({ "c": channel }),
        )
        .await;
    let message = &data["createMessage"];
    let id = message["id"].as_str().unwrap().to_string();
    assert_eq!(message["senderId"], json!(alice.id()));
    assert_eq!(message["messageType"], json!("PHOTO"));
    assert_eq!(message["imageUrls"], json!(["http://x/a.png"]));
    assert_eq!(message["fileUrls"], json!([]));
    assert_eq!(message["deletedAt"], serde_json::Value::Null);
    assert_eq!(message["sender"]["name"], json!("alice"));

    let data = h
        .ok(
            Some(&alice),
            "query($id: String!) { channel(id: $id) { lastMessageId } }",
            json!({ "id": channel }),
        )
        .await;
    assert_eq!(data["channel"]["lastMessageId"], json!(id));

    let delete = "mutation($id: String!) { deleteMessage(id: $id) { id deletedAt } }";
    let data = h.ok(Some(&alice), delete, json!({ "id": id })).await;
    let deleted_at = data["deleteMessage"]["deletedAt"].as_str().unwrap().to_string();

    // still listed, as a tombstone
    let data = h
        .ok(
            Some(&alice),
            "query($id: String!) { channel(id: $id) { messages { edges { node { id deletedAt } } } } }",
            json!({ "id": channel }),
        )
        .await;
    let edges = data["channel"]["messages"]["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["node"]["id"], json!(id));
    assert_eq!(edges[0]["node"]["deletedAt"], json!(deleted_at));

    // deleting again keeps the first timestamp
    let data = h.ok(Some(&alice), delete, json!({ "id": id })).await;
    assert_eq!(data["deleteMessage"]["deletedAt"], json!(deleted_at));

    let data = h.ok(Some(&alice), delete, json!({ "id": "missing" })).await;
    assert_eq!(data["deleteMessage"], serde_json::Value::Null);
}

#[tokio::test]
async fn message_mutations_check_identity_and_membership() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let mallory = h.user("mallory").await;
    let channel = h.channel(&alice, &[]).await;

    let create = "mutation($c: String!) { createMessage(channelId: $c, message: { text: \"hi\" }) { id } }";

    let resp = h.execute(None, create, json!({ "c": channel })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("UNAUTHORIZED"));

    let resp = h.execute(Some(&mallory), create, json!({ "c": channel })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));

    let resp = h.execute(Some(&alice), create, json!({ "c": "nope" })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("NOT_FOUND"));

    let resp = h
        .execute(None, "mutation { deleteMessage(id: \"x\") { id } }", json!({}))
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("UNAUTHORIZED"));

    let resp = h
        .execute(
            Some(&mallory),
            "query($id: String!) { channel(id: $id) { id } }",
            json!({ "id": channel }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));

    // outsiders can neither read nor tombstone a member's message
    let secret = h.say(&alice, &channel, "secret").await;
    let delete = "mutation($id: String!) { deleteMessage(id: $id) { id text deletedAt } }";
    let resp = h.execute(Some(&mallory), delete, json!({ "id": secret })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("FORBIDDEN"));
    assert_eq!(resp.data.into_json().unwrap()["deleteMessage"], serde_json::Value::Null);

    let data = h
        .ok(
            Some(&alice),
            "query($id: String!) { channel(id: $id) { lastMessageId lastMessage { deletedAt } } }",
            json!({ "id": channel }),
        )
        .await;
    assert_eq!(data["channel"]["lastMessageId"], json!(secret));
    assert_eq!(data["channel"]["lastMessage"]["deletedAt"], serde_json::Value::Null);

    let data = h.ok(Some(&mallory), delete, json!({ "id": "missing" })).await;
    assert_eq!(data["deleteMessage"], serde_json::Value::Null);
}

#[tokio::test]
async fn deleted_channel_is_not_returned() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let channel = h.channel(&alice, &[]).await;

    sqlx::query("UPDATE channels SET deleted_at = ? WHERE id = ?")
        .bind("2024-01-01T00:00:00.000000Z")
        .bind(&channel)
        .execute(h.state.db.pool())
        .await
        .unwrap();

    let data = h
        .ok(
            Some(&alice),
            "query($id: String!) { channel(id: $id) { id } }",
            json!({ "id": channel }),
        )
        .await;
    assert_eq!(data["channel"], serde_json::Value::Null);

    let data = h.ok(Some(&alice), "{ myChannels { id } }", json!({})).await;
    assert_eq!(data["myChannels"], json!([]));
}

// ============================================================================
// Push fan-out
// ============================================================================

#[tokio::test]
async fn create_message_pushes_to_every_other_member() {
    let h = Harness::new().await;
    let u1 = h.user("u1").await;
    let u2 = h.user("u2").await;
    let u3 = h.user("u3").await;
    let channel = h.channel(&u1, &[&u2, &u3]).await;

    for (user, token) in [(&u1, "tok-u1"), (&u2, "tok-u2"), (&u3, "tok-u3")] {
        h.ok(
            Some(user),
            "mutation($t: String!) { registerPushToken(token: $t) }",
            json!({ "t": token }),
        )
        .await;
    }

    let message_id = h.say(&u1, &channel, "hello").await;

    let sent = h.gateway.wait_for(2).await;
    assert_eq!(sent.len(), 2);

    let mut receivers: Vec<&str> = sent.iter().map(|m| m.to.as_str()).collect();
    receivers.sort();
    assert_eq!(receivers, vec!["tok-u2", "tok-u3"]);

    for push in &sent {
        assert_eq!(push.title, "u1");
        assert_eq!(push.body, "hello");
        assert_eq!(push.sound, "default");
        let link: serde_json::Value = serde_json::from_str(&push.data.data).unwrap();
        assert_eq!(link, json!({ "messageId": message_id, "channelId": channel }));
    }

    let stats = h.state.notifications.stats();
    assert_eq!(stats.sent, 2);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn media_push_body_follows_request_locale() {
    let h = Harness::new().await;
    let u1 = h.user("u1").await;
    let u2 = h.user("u2").await;
    let channel = h.channel(&u1, &[&u2]).await;

    h.ok(
        Some(&u2),
        "mutation { registerPushToken(token: \"tok-u2\", device: \"ios\") }",
        json!({}),
    )
    .await;

    let resp = h
        .execute_with_locale(
            &u1,
            Locale::Ko,
            "mutation($c: String!) { createMessage(channelId: $c, message: { messageType: FILE, fileUrls: [\"http://x/a.pdf\"] }) { id } }",
            json!({ "c": channel }),
        )
        .await;
    assert!(resp.errors.is_empty(), "{:?}", resp.errors);

    let sent = h.gateway.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, "파일을 보냈습니다");
}

// ============================================================================
// Accounts and subscriptions
// ============================================================================

#[tokio::test]
async fn sign_up_and_sign_in_over_graphql() {
    let h = Harness::new().await;

    let data = h
        .ok(
            None,
            r#"mutation { signUp(input: { email: "zed@example.com", password: "pw123456", name: "Zed" }) { token user { id name } } }"#,
            json!({}),
        )
        .await;
    let user_id = data["signUp"]["user"]["id"].as_str().unwrap().to_string();
    let token = data["signUp"]["token"].as_str().unwrap();
    assert_eq!(h.state.auth.verify_token(token).unwrap().user_id, user_id);

    let resp = h
        .execute(
            None,
            r#"mutation { signUp(input: { email: "ZED@example.com", password: "x", name: "Z" }) { token } }"#,
            json!({}),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("BAD_USER_INPUT"));

    let resp = h
        .execute(
            None,
            r#"mutation { signIn(email: "zed@example.com", password: "wrong") { token } }"#,
            json!({}),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("UNAUTHORIZED"));

    let data = h
        .ok(
            None,
            r#"mutation { signIn(email: "zed@example.com", password: "pw123456") { user { id } } }"#,
            json!({}),
        )
        .await;
    assert_eq!(data["signIn"]["user"]["id"], json!(user_id));
}

#[tokio::test]
async fn user_signed_in_subscription_only_sees_requested_user() {
    let h = Harness::new().await;
    let u2 = h.user("u2").await;
    h.user("u3").await;

    let mut stream = h.state.schema.execute_stream(
        async_graphql::Request::new("subscription($id: String!) { userSignedIn(userId: $id) { id name } }")
            .variables(async_graphql::Variables::from_json(json!({ "id": u2.id() }))),
    );

    // Sign both users in repeatedly until the subscriber has seen enough
    let schema = h.state.schema.clone();
    let publisher = tokio::spawn(async move {
        loop {
            for email in ["u3@example.com", "u2@example.com"] {
                let query = format!(
                    r#"mutation {{ signIn(email: "{}", password: "password") {{ token }} }}"#,
                    email
                );
                schema.execute(query).await;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });

    let mut seen = Vec::new();
    while seen.len() < 3 {
        let resp = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("subscription timed out")
            .expect("stream ended");
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let data = resp.data.into_json().unwrap();
        seen.push(data["userSignedIn"]["id"].as_str().unwrap().to_string());
    }
    publisher.abort();

    assert!(seen.iter().all(|id| id == u2.id()));
}

#[tokio::test]
async fn update_profile_publishes_user_updated() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;

    let mut stream = h.state.schema.execute_stream(
        async_graphql::Request::new(
            "subscription($id: String!) { userUpdated(userId: $id) { id statusMessage } }",
        )
        .variables(async_graphql::Variables::from_json(json!({ "id": alice.id() }))),
    );

    let schema = h.state.schema.clone();
    let auth = alice.auth.clone();
    let publisher = tokio::spawn(async move {
        loop {
            let request = async_graphql::Request::new(
                r#"mutation { updateProfile(input: { statusMessage: "busy" }) { id } }"#,
            )
            .data(auth.clone());
            schema.execute(request).await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });

    let resp = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("subscription timed out")
        .expect("stream ended");
    publisher.abort();

    let data = resp.data.into_json().unwrap();
    assert_eq!(data["userUpdated"]["id"], json!(alice.id()));
    assert_eq!(data["userUpdated"]["statusMessage"], json!("busy"));

    // null clears the field
    let data = h
        .ok(
            Some(&alice),
            "mutation { updateProfile(input: { statusMessage: null }) { statusMessage name } }",
            json!({}),
        )
        .await;
    assert_eq!(data["updateProfile"]["statusMessage"], serde_json::Value::Null);
    assert_eq!(data["updateProfile"]["name"], json!("alice"));
}

#[tokio::test]
async fn my_channels_and_blocked_users() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;

    let first = h.channel(&alice, &[&bob]).await;
    let second = h.channel(&bob, &[]).await;
    let third = h.channel(&alice, &[]).await;
    h.say(&alice, &first, "bump").await;

    let data = h.ok(Some(&alice), "{ myChannels { id } }", json!({})).await;
    let ids: Vec<&str> = data["myChannels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first.as_str(), third.as_str()]);
    assert!(!ids.contains(&second.as_str()));

    let resp = h
        .execute(
            Some(&alice),
            "mutation($id: String!) { blockUser(userId: $id) }",
            json!({ "id": alice.id() }),
        )
        .await;
    assert_eq!(error_code(&resp).as_deref(), Some("BAD_USER_INPUT"));

    h.ok(
        Some(&alice),
        "mutation($id: String!) { blockUser(userId: $id) }",
        json!({ "id": bob.id() }),
    )
    .await;
    let data = h.ok(Some(&alice), "{ blockedUsers { id } }", json!({})).await;
    assert_eq!(data["blockedUsers"], json!([{ "id": bob.id() }]));

    let data = h.ok(Some(&alice), "{ me { id email } }", json!({})).await;
    assert_eq!(data["me"]["email"], json!("alice@example.com"));

    let lookup = "query($id: String!) { user(id: $id) { name } }";
    let data = h.ok(Some(&alice), lookup, json!({ "id": bob.id() })).await;
    assert_eq!(data["user"]["name"], json!("bob"));

    let resp = h.execute(None, lookup, json!({ "id": bob.id() })).await;
    assert_eq!(error_code(&resp).as_deref(), Some("UNAUTHORIZED"));
}

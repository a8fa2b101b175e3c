use chosei_core::invite::MeetingInvite;
use chosei_core::schedule::Attendee;
use chosei_graph::convert::ToGraph;
use chosei_graph::{AccessToken, GraphClient, GraphError};
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token() -> AccessToken {
    AccessToken::expiring_in("test-token".to_string(), vec![], 3600)
}

fn invite() -> MeetingInvite {
    let day = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
    MeetingInvite {
        subject: "会議: 3/31 16:00~17:00".to_string(),
        body: "3/31 16:00~17:00の会議にご参加ください。".to_string(),
        location: "オンライン".to_string(),
        start: day.and_hms_opt(16, 0, 0).unwrap(),
        end: day.and_hms_opt(17, 0, 0).unwrap(),
        time_zone: "Asia/Tokyo".to_string(),
        attendees: vec![Attendee::new("mori@example.com", Some("Mori Aoi"))],
    }
}

#[tokio::test]
async fn test_create_event_posts_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me/events"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "start": { "dateTime": "2025-03-31T16:00:00", "timeZone": "Asia/Tokyo" },
            "isOnlineMeeting": true,
            "onlineMeetingProvider": "teamsForBusiness",
            "attendees": [{ "emailAddress": { "address": "mori@example.com", "name": "Mori Aoi" }, "type": "required" }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "AAMk1",
            "subject": "会議: 3/31 16:00~17:00",
            "onlineMeeting": { "joinUrl": "https://teams.example/join" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(server.uri());
    let created = client
        .create_event(&token(), &invite().to_graph())
        .await
        .unwrap();

    assert_eq!(created.id, "AAMk1");
    assert_eq!(
        created.online_meeting.and_then(|m| m.join_url).as_deref(),
        Some("https://teams.example/join")
    );
}

#[tokio::test]
async fn test_create_event_non_success_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me/events"))
        .respond_with(ResponseTemplate::new(403).set_body_string("{\"error\":\"forbidden\"}"))
        .mount(&server)
        .await;

    let client = GraphClient::new(server.uri());
    let err = client
        .create_event(&token(), &invite().to_graph())
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::Status { status: 403, .. }));
}

#[tokio::test]
async fn test_list_users_selects_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("$select", "id,displayName,userPrincipalName"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "1", "displayName": "Akiyama Ren", "userPrincipalName": "akiyama@example.com" },
                { "id": "2", "displayName": null, "userPrincipalName": "svc@example.com" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let users = GraphClient::new(server.uri())
        .list_users(&token())
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].display_name, "Akiyama Ren");
    assert_eq!(users[1].display_name, "");
}

#[tokio::test]
async fn test_list_users_skips_malformed_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "displayName": "No Id", "userPrincipalName": "noid@example.com" },
                { "id": "2", "displayName": "Hayashi Mei", "userPrincipalName": "hayashi@example.com" }
            ]
        })))
        .mount(&server)
        .await;

    let users = GraphClient::new(server.uri())
        .list_users(&token())
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, "2");
}

#[tokio::test]
async fn test_list_users_without_value_is_unexpected_format() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": [] })))
        .mount(&server)
        .await;

    let err = GraphClient::new(server.uri())
        .list_users(&token())
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::UnexpectedFormat(_)));
}

#[tokio::test]
async fn test_list_users_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = GraphClient::new(server.uri())
        .list_users(&token())
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::Status { status: 500, .. }));
}

// Connection handshake, protocol errors and teardown

use std::time::Duration;

use crate::support::websocket::{start_test_server, test_state, wait_for_games};
use crate::support::websocket_client::WebSocketClient;

#[tokio::test]
async fn hello_lists_loaded_languages() -> Result<(), Box<dyn std::error::Error>> {
    let (server_handle, addr, server_join) = start_test_server(test_state()).await?;

    let (mut client, hello) = WebSocketClient::connect_greeted(&format!("ws://{addr}/ws")).await?;

    assert_eq!(hello["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(hello["languages"][0]["lang"], "en");
    assert_eq!(hello["languages"][0]["prompts"], 20);
    assert_eq!(hello["languages"][0]["answers"], 100);

    client.close().await?;
    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_answered_and_closed() -> Result<(), Box<dyn std::error::Error>> {
    let (server_handle, addr, server_join) = start_test_server(test_state()).await?;
    let (mut client, _) = WebSocketClient::connect_greeted(&format!("ws://{addr}/ws")).await?;

    client.send_text("{not json").await?;

    let err = client.recv_type("error").await?;
    assert_eq!(err["code"], "bad_request");
    assert!(client.recv_json().await?.is_none());

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn closing_the_last_socket_removes_the_game() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state();
    let registry = state.registry();
    let (server_handle, addr, server_join) = start_test_server(state).await?;
    let (mut client, _) = WebSocketClient::connect_greeted(&format!("ws://{addr}/ws")).await?;

    client.login("1", "Host").await?;
    client.create_game().await?;
    assert_eq!(registry.len(), 1);

    client.close().await?;
    wait_for_games(&registry, 0, Duration::from_secs(2)).await?;

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

use std::time::Duration;

use reqwest::{Client, Error};

const USER_AGENT: &str = concat!("melodeck/", env!("CARGO_PKG_VERSION"));

pub struct HttpClient;

impl HttpClient {
  /// Client shared by the HTTP source. Resolution timeouts live here, not in the player.
  pub fn new() -> Result<Client, Error> {
    Client::builder()
      .user_agent(USER_AGENT)
      .timeout(Duration::from_secs(10))
      .build()
  }
}

// https://firebase.google.com/docs/reference/rest/auth#section-get-account-info

use std::collections::HashMap;

pub mod models;

use reqwest::Client;

use crate::models::{AccountInfo, LookupResponse};

#[derive(Debug, Clone)]
pub struct FirebaseOptions {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct FirebaseService {
    options: FirebaseOptions,
}

impl FirebaseService {
    pub fn new(options: FirebaseOptions) -> Self {
        Self { options }
    }

    /// Verify a Firebase ID token by asking the identity toolkit to resolve
    /// it to an account. Returns the account on success.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<AccountInfo, &'static str> {
        let url = format!(
            "https://identitytoolkit.googleapis.com/v1/accounts:lookup?key={key}",
            key = self.options.api_key
        );

        let mut body: HashMap<&str, &str> = HashMap::new();
        body.insert("idToken", id_token);

        let client = Client::new();
        let res = client.post(url).json(&body).send().await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error_body = response.text().await.unwrap_or_default();
                    eprintln!("Firebase error ({}): {}", status, error_body);
                    return Err("Firebase rejected the ID token");
                }

                let result = response.json::<LookupResponse>().await;
                match result {
                    Ok(data) => data
                        .users
                        .and_then(|mut users| {
                            if users.is_empty() {
                                None
                            } else {
                                Some(users.remove(0))
                            }
                        })
                        .ok_or("Firebase returned no account for the ID token"),
                    Err(e) => {
                        eprintln!("Failed to parse Firebase response: {}", e);
                        Err("Error parsing Firebase lookup response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to Firebase failed: {}", e);
                Err("Error verifying ID token")
            }
        }
    }
}

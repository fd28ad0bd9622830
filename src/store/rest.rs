use super::traits::{DocumentStore, ObjectStore, StoreResult};
use crate::error::StoreError;
use crate::models::lenient::text_from;
use crate::models::{
    ActivationCode, Inquiry, Listing, ListingPatch, Role, Tip, UserProfile, Visit, VisitSlot,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const PROPERTIES: &str = "properties";
const USERS: &str = "users";
const VISITS: &str = "visits";
const INQUIRIES: &str = "inquiries";
const TIPS: &str = "tips";
const ACTIVATION_CODES: &str = "activation_codes";

/// One entry of a `:commit` batch. The whole batch applies or none of it does.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum Write {
    #[serde(rename_all = "camelCase")]
    Create {
        collection: &'static str,
        id: String,
        data: Value,
    },
    #[serde(rename_all = "camelCase")]
    Update {
        collection: &'static str,
        id: String,
        data: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        if_version: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Increment {
        collection: &'static str,
        id: String,
        field: &'static str,
        by: i64,
    },
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

/// Document store reached over the BaaS JSON REST API.
///
/// Documents come back as JSON objects with their `id` and an opaque
/// `version`; multi-document writes go through `POST {base}:commit`, which
/// answers 409 when an `ifVersion` precondition fails.
pub struct RestStore {
    client: Client,
    base: String,
    token: Option<String>,
}

impl RestStore {
    pub fn new(base: &str, token: Option<String>, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("inmo-market/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    /// `{base}/{collection}/{id}` with `id` escaped as a single path segment
    fn doc_url(&self, collection: &str, id: &str) -> StoreResult<Url> {
        let mut url = Url::parse(&self.base)
            .map_err(|e| StoreError::Backend(format!("bad store URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Backend("store URL cannot be a base".into()))?
            .pop_if_empty()
            .push(collection)
            .push(id);
        Ok(url)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> StoreResult<Response> {
        let response = self.authed(req).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(what.to_string())),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Err(StoreError::Conflict(format!("{what}: {body}")))
            }
            _ => {
                warn!("Store returned {} for {}", status, what);
                Err(StoreError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Raw document plus its version, `None` when it doesn't exist
    async fn get_raw(&self, collection: &str, id: &str) -> StoreResult<Option<(Value, Option<String>)>> {
        let what = format!("{collection}/{id}");
        let req = self.client.get(self.doc_url(collection, id)?);
        match self.send(req, &what).await {
            Ok(response) => {
                let mut doc: Value = response.json().await?;
                let version = doc
                    .get("version")
                    .or_else(|| doc.get("updateTime"))
                    .and_then(text_from);
                if let Value::Object(map) = &mut doc {
                    map.entry("id").or_insert_with(|| Value::String(id.to_string()));
                }
                Ok(Some((doc, version)))
            }
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> StoreResult<Option<T>> {
        match self.get_raw(collection, id).await? {
            Some((doc, _)) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Equality filters plus an optional descending order
    async fn query<T: DeserializeOwned>(
        &self,
        collection: &str,
        filters: &[(&str, &str)],
        order_desc: Option<&str>,
    ) -> StoreResult<Vec<T>> {
        let mut url = Url::parse(&self.url(collection))
            .map_err(|e| StoreError::Backend(format!("bad store URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (field, value) in filters {
                pairs.append_pair(field, value);
            }
            if let Some(field) = order_desc {
                pairs.append_pair("orderBy", field);
                pairs.append_pair("direction", "desc");
            }
        }
        debug!("Querying {}", url);

        let response = self.send(self.client.get(url), collection).await?;
        let docs: Vec<Value> = response.json().await?;
        // Skip documents that don't even have the shape of T instead of
        // failing the whole page.
        Ok(docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping malformed {} document: {}", collection, e);
                    None
                }
            })
            .collect())
    }

    async fn create<T: Serialize>(&self, collection: &str, doc: &T) -> StoreResult<String> {
        let body = without_id(doc)?;
        let response = self
            .send(self.client.post(self.url(collection)).json(&body), collection)
            .await?;
        let created: Created = response.json().await?;
        Ok(created.id)
    }

    async fn patch(&self, collection: &str, id: &str, body: &Value) -> StoreResult<()> {
        let what = format!("{collection}/{id}");
        self.send(self.client.patch(self.doc_url(collection, id)?).json(body), &what)
            .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let what = format!("{collection}/{id}");
        self.send(self.client.delete(self.doc_url(collection, id)?), &what)
            .await?;
        Ok(())
    }

    /// Read-modify-write of a listing's offered slots, guarded by its version
    async fn edit_slots<F>(&self, listing_id: &str, edit: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Vec<VisitSlot>) -> StoreResult<()> + Send,
    {
        let what = format!("{PROPERTIES}/{listing_id}");
        let (doc, version) = self
            .get_raw(PROPERTIES, listing_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(what.clone()))?;
        let version = read_version(&what, version)?;
        let mut listing: Listing = serde_json::from_value(doc)?;
        edit(&mut listing.visit_slots)?;

        let write = Write::Update {
            collection: PROPERTIES,
            id: listing_id.to_string(),
            data: serde_json::to_value(ListingPatch::slots(listing.visit_slots))?,
            if_version: Some(version),
        };
        match self.commit(vec![write]).await {
            Err(StoreError::Conflict(reason)) => Err(StoreError::Backend(format!(
                "{what} changed while editing slots: {reason}"
            ))),
            other => other,
        }
    }

    async fn commit(&self, writes: Vec<Write>) -> StoreResult<()> {
        let url = format!("{}:commit", self.base);
        debug!("Committing {} writes", writes.len());
        self.send(self.client.post(url).json(&json!({ "writes": writes })), "commit")
            .await?;
        Ok(())
    }
}

// Guarded writes need the version the document was read at.
fn read_version(what: &str, version: Option<String>) -> StoreResult<String> {
    version.ok_or_else(|| StoreError::Backend(format!("{what} came back without a version")))
}

fn without_id<T: Serialize>(doc: &T) -> StoreResult<Value> {
    let mut value = serde_json::to_value(doc)?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    Ok(value)
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn listings(&self) -> StoreResult<Vec<Listing>> {
        self.query(PROPERTIES, &[], Some("createdAt")).await
    }

    async fn listing(&self, id: &str) -> StoreResult<Option<Listing>> {
        self.get(PROPERTIES, id).await
    }

    async fn listings_by_agent(&self, agent_id: &str) -> StoreResult<Vec<Listing>> {
        self.query(PROPERTIES, &[("agentId", agent_id)], Some("createdAt"))
            .await
    }

    async fn create_listing(&self, listing: &Listing) -> StoreResult<String> {
        self.create(PROPERTIES, listing).await
    }

    async fn update_listing(&self, id: &str, patch: &ListingPatch) -> StoreResult<()> {
        self.patch(PROPERTIES, id, &serde_json::to_value(patch)?).await
    }

    async fn delete_listing(&self, id: &str) -> StoreResult<()> {
        self.delete(PROPERTIES, id).await
    }

    async fn increment_views(&self, id: &str) -> StoreResult<()> {
        self.commit(vec![Write::Increment {
            collection: PROPERTIES,
            id: id.to_string(),
            field: "views",
            by: 1,
        }])
        .await
    }

    async fn book_visit(
        &self,
        listing_id: &str,
        slot_id: &str,
        visit: &Visit,
    ) -> StoreResult<Visit> {
        let (doc, version) = self
            .get_raw(PROPERTIES, listing_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{PROPERTIES}/{listing_id}")))?;
        let version = read_version(&format!("{PROPERTIES}/{listing_id}"), version)?;
        let listing: Listing = serde_json::from_value(doc)?;
        if listing.slot(slot_id).is_none() {
            return Err(StoreError::Conflict(format!("slot {slot_id} is not offered")));
        }

        let remaining: Vec<_> = listing
            .visit_slots
            .iter()
            .filter(|s| s.id != slot_id)
            .cloned()
            .collect();
        let mut booked = visit.clone();
        booked.id = Uuid::new_v4().simple().to_string();

        let writes = vec![
            Write::Update {
                collection: PROPERTIES,
                id: listing_id.to_string(),
                data: serde_json::to_value(ListingPatch::slots(remaining))?,
                if_version: Some(version),
            },
            Write::Create {
                collection: VISITS,
                id: booked.id.clone(),
                data: without_id(&booked)?,
            },
        ];

        match self.commit(writes).await {
            Ok(()) => Ok(booked),
            Err(StoreError::Conflict(reason)) => {
                // Someone else wrote the listing between our read and commit.
                // Only report the slot as taken if it really is.
                let still_offered = self
                    .listing(listing_id)
                    .await?
                    .is_some_and(|l| l.slot(slot_id).is_some());
                if still_offered {
                    Err(StoreError::Backend(format!(
                        "listing {listing_id} changed while booking: {reason}"
                    )))
                } else {
                    Err(StoreError::Conflict(format!("slot {slot_id} was just booked")))
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn add_visit_slot(&self, listing_id: &str, slot: &VisitSlot) -> StoreResult<()> {
        let slot = slot.clone();
        self.edit_slots(listing_id, move |slots| {
            slots.push(slot);
            Ok(())
        })
        .await
    }

    async fn remove_visit_slot(&self, listing_id: &str, slot_id: &str) -> StoreResult<()> {
        self.edit_slots(listing_id, |slots| {
            let position = slots
                .iter()
                .position(|s| s.id == slot_id)
                .ok_or_else(|| StoreError::NotFound(format!("slot {slot_id}")))?;
            slots.remove(position);
            Ok(())
        })
        .await
    }

    async fn user(&self, uid: &str) -> StoreResult<Option<UserProfile>> {
        self.get(USERS, uid).await
    }

    async fn put_user(&self, profile: &UserProfile) -> StoreResult<()> {
        let what = format!("{USERS}/{}", profile.uid);
        self.send(self.client.put(self.doc_url(USERS, &profile.uid)?).json(profile), &what)
            .await?;
        Ok(())
    }

    async fn users(&self) -> StoreResult<Vec<UserProfile>> {
        self.query(USERS, &[], Some("createdAt")).await
    }

    async fn set_user_role(&self, uid: &str, role: Role) -> StoreResult<()> {
        self.patch(USERS, uid, &json!({ "role": role })).await
    }

    async fn delete_user(&self, uid: &str) -> StoreResult<()> {
        self.delete(USERS, uid).await
    }

    async fn visits(&self) -> StoreResult<Vec<Visit>> {
        self.query(VISITS, &[], Some("timestamp")).await
    }

    async fn visits_for_agent(&self, agent_id: &str) -> StoreResult<Vec<Visit>> {
        self.query(VISITS, &[("agentId", agent_id)], Some("timestamp"))
            .await
    }

    async fn visits_for_client(&self, client_id: &str) -> StoreResult<Vec<Visit>> {
        self.query(VISITS, &[("clientId", client_id)], Some("timestamp"))
            .await
    }

    async fn create_inquiry(&self, inquiry: &Inquiry) -> StoreResult<String> {
        self.create(INQUIRIES, inquiry).await
    }

    async fn inquiries_for_agent(&self, agent_id: &str) -> StoreResult<Vec<Inquiry>> {
        self.query(INQUIRIES, &[("agentId", agent_id)], Some("timestamp"))
            .await
    }

    async fn mark_inquiry_read(&self, id: &str) -> StoreResult<()> {
        self.patch(INQUIRIES, id, &json!({ "read": true })).await
    }

    async fn tips(&self) -> StoreResult<Vec<Tip>> {
        self.query(TIPS, &[("published", "true")], Some("createdAt"))
            .await
    }

    async fn create_tip(&self, tip: &Tip) -> StoreResult<String> {
        self.create(TIPS, tip).await
    }

    async fn delete_tip(&self, id: &str) -> StoreResult<()> {
        self.delete(TIPS, id).await
    }

    async fn create_activation_code(&self, code: &ActivationCode) -> StoreResult<()> {
        // Codes are keyed by their own value so redemption is a point read.
        self.commit(vec![Write::Create {
            collection: ACTIVATION_CODES,
            id: code.code.clone(),
            data: serde_json::to_value(code)?,
        }])
        .await
    }

    async fn redeem_activation_code(&self, code: &str, uid: &str) -> StoreResult<()> {
        let (doc, version) = self
            .get_raw(ACTIVATION_CODES, code)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{ACTIVATION_CODES}/{code}")))?;
        let version = read_version(&format!("{ACTIVATION_CODES}/{code}"), version)?;
        let entry: ActivationCode = serde_json::from_value(doc)?;
        if entry.used {
            return Err(StoreError::Conflict(format!("code {code} already used")));
        }

        self.commit(vec![
            Write::Update {
                collection: ACTIVATION_CODES,
                id: code.to_string(),
                data: json!({ "used": true, "usedBy": uid, "usedAt": Utc::now() }),
                if_version: Some(version),
            },
            Write::Update {
                collection: USERS,
                id: uid.to_string(),
                data: json!({ "role": Role::Agent }),
                if_version: None,
            },
        ])
        .await
    }
}

/// Object storage bucket over REST (`POST {base}/o?name={path}`)
pub struct RestObjects {
    client: Client,
    base: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Uploaded {
    download_url: Option<String>,
}

impl RestObjects {
    pub fn new(base: &str, token: Option<String>, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn media_url(&self, path: &str) -> StoreResult<String> {
        let mut url = Url::parse(&format!("{}/o/", self.base))
            .map_err(|e| StoreError::Backend(format!("bad storage URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Backend("storage URL cannot be a base".into()))?
            .pop_if_empty()
            .push(path);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url.to_string())
    }
}

#[async_trait]
impl ObjectStore for RestObjects {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<String> {
        let mut url = Url::parse(&format!("{}/o", self.base))
            .map_err(|e| StoreError::Backend(format!("bad storage URL: {e}")))?;
        url.query_pairs_mut().append_pair("name", path);

        let mut req = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Upload of {} failed with {}", path, status);
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: Uploaded = response.json().await?;
        match uploaded.download_url {
            Some(url) => Ok(url),
            None => self.media_url(path),
        }
    }
}

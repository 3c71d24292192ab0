//! MongoDB implementation of [`LeadStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::models::{
    CampaignStatus, Contact, LeadKind, LeadStatus, NewCampaign, NewContact, NewPopupSubmission,
    NewSubscriber, NewsletterCampaign, NewsletterSubscriber, PopupSubmission, RecentLead,
    SubscriberStatus, DEFAULT_PROJECT_TYPE, POPUP_SOURCE, SUBSCRIBER_SOURCE,
};
use super::{LeadStore, Result, StoreError};

/// Collection names, matching the documents already written by the site.
const CONTACTS_COLLECTION: &str = "contacts";
const POPUPS_COLLECTION: &str = "popups";
const SUBSCRIBERS_COLLECTION: &str = "newslettersubscribers";
const CAMPAIGNS_COLLECTION: &str = "newslettercampaigns";

/// Server error code for unique index violations.
const DUPLICATE_KEY: i32 = 11000;

fn to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

fn from_bson(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "createdAt": -1 }).build()
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

// ============================================================================
// Stored document shapes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    #[serde(default)]
    phone: String,
    message: String,
    #[serde(default = "default_project_type")]
    project_type: String,
    #[serde(default)]
    status: LeadStatus,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

fn default_project_type() -> String {
    DEFAULT_PROJECT_TYPE.to_string()
}

impl From<ContactRecord> for Contact {
    fn from(r: ContactRecord) -> Self {
        Contact {
            id: r.id.to_hex(),
            name: r.name,
            email: r.email,
            phone: r.phone,
            message: r.message,
            project_type: r.project_type,
            status: r.status,
            created_at: from_bson(r.created_at),
            updated_at: from_bson(r.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PopupRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default = "default_project_type")]
    project_type: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: LeadStatus,
    #[serde(default = "default_popup_source")]
    source: String,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

fn default_popup_source() -> String {
    POPUP_SOURCE.to_string()
}

impl From<PopupRecord> for PopupSubmission {
    fn from(r: PopupRecord) -> Self {
        PopupSubmission {
            id: r.id.to_hex(),
            name: r.name,
            email: r.email,
            phone: r.phone,
            project_type: r.project_type,
            message: r.message,
            status: r.status,
            source: r.source,
            created_at: from_bson(r.created_at),
            updated_at: from_bson(r.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriberRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    status: SubscriberStatus,
    #[serde(default = "default_subscriber_source")]
    source: String,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

fn default_subscriber_source() -> String {
    SUBSCRIBER_SOURCE.to_string()
}

impl From<SubscriberRecord> for NewsletterSubscriber {
    fn from(r: SubscriberRecord) -> Self {
        NewsletterSubscriber {
            id: r.id.to_hex(),
            email: r.email,
            name: r.name,
            status: r.status,
            source: r.source,
            created_at: from_bson(r.created_at),
            updated_at: from_bson(r.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CampaignRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    subject: String,
    content: String,
    #[serde(default)]
    recipients: i64,
    #[serde(default)]
    open_rate: f64,
    #[serde(default)]
    click_rate: f64,
    #[serde(default)]
    status: CampaignStatus,
    #[serde(default)]
    sent_at: Option<BsonDateTime>,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

impl From<CampaignRecord> for NewsletterCampaign {
    fn from(r: CampaignRecord) -> Self {
        NewsletterCampaign {
            id: r.id.to_hex(),
            subject: r.subject,
            content: r.content,
            recipients: r.recipients,
            open_rate: r.open_rate,
            click_rate: r.click_rate,
            status: r.status,
            sent_at: r.sent_at.map(from_bson),
            created_at: from_bson(r.created_at),
            updated_at: from_bson(r.updated_at),
        }
    }
}

/// Projection used by the dashboard feed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    name: Option<String>,
    email: String,
    created_at: BsonDateTime,
}

// ============================================================================
// Store
// ============================================================================

/// MongoDB implementation of LeadStore.
pub struct MongoStore {
    database: Database,
    contacts: Collection<ContactRecord>,
    popups: Collection<PopupRecord>,
    subscribers: Collection<SubscriberRecord>,
    campaigns: Collection<CampaignRecord>,
}

impl MongoStore {
    pub fn new(client: &Client, database_name: &str) -> Self {
        let database = client.database(database_name);

        Self {
            contacts: database.collection(CONTACTS_COLLECTION),
            popups: database.collection(POPUPS_COLLECTION),
            subscribers: database.collection(SUBSCRIBERS_COLLECTION),
            campaigns: database.collection(CAMPAIGNS_COLLECTION),
            database,
        }
    }

    /// Creates the unique subscriber email index.
    pub async fn init(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.subscribers.create_index(index).await?;

        Ok(())
    }

    fn lead_collection(&self, kind: LeadKind) -> Collection<Document> {
        match kind {
            LeadKind::Contact => self.contacts.clone_with_type(),
            LeadKind::Newsletter => self.subscribers.clone_with_type(),
            LeadKind::Popup => self.popups.clone_with_type(),
        }
    }
}

async fn find_all<T, M>(collection: &Collection<T>) -> Result<Vec<M>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
    M: From<T>,
{
    let records: Vec<T> = collection
        .find(doc! {})
        .with_options(newest_first())
        .await?
        .try_collect()
        .await?;

    Ok(records.into_iter().map(M::from).collect())
}

fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

#[async_trait]
impl LeadStore for MongoStore {
    async fn create_contact(&self, contact: NewContact) -> Result<Contact> {
        let now = to_bson(Utc::now());
        let record = ContactRecord {
            id: ObjectId::new(),
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            message: contact.message,
            project_type: contact.project_type,
            status: LeadStatus::New,
            created_at: now,
            updated_at: now,
        };

        self.contacts.insert_one(&record).await?;

        Ok(record.into())
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>> {
        find_all(&self.contacts).await
    }

    async fn find_contact(&self, id: &str) -> Result<Option<Contact>> {
        let Some(oid) = parse_id(id) else {
            return Ok(None);
        };

        let record = self.contacts.find_one(doc! { "_id": oid }).await?;
        Ok(record.map(Contact::from))
    }

    async fn set_contact_status(&self, id: &str, status: LeadStatus) -> Result<Option<Contact>> {
        let Some(oid) = parse_id(id) else {
            return Ok(None);
        };

        let update = doc! {
            "$set": {
                "status": status.as_str(),
                "updatedAt": to_bson(Utc::now()),
            }
        };

        let record = self
            .contacts
            .find_one_and_update(doc! { "_id": oid }, update)
            .with_options(return_updated())
            .await?;

        Ok(record.map(Contact::from))
    }

    async fn create_popup(&self, popup: NewPopupSubmission) -> Result<PopupSubmission> {
        let now = to_bson(Utc::now());
        let record = PopupRecord {
            id: ObjectId::new(),
            name: popup.name,
            email: popup.email,
            phone: popup.phone,
            project_type: popup.project_type,
            message: popup.message,
            status: LeadStatus::New,
            source: POPUP_SOURCE.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.popups.insert_one(&record).await?;

        Ok(record.into())
    }

    async fn list_popups(&self) -> Result<Vec<PopupSubmission>> {
        find_all(&self.popups).await
    }

    async fn create_subscriber(&self, subscriber: NewSubscriber) -> Result<NewsletterSubscriber> {
        let now = to_bson(Utc::now());
        let record = SubscriberRecord {
            id: ObjectId::new(),
            email: subscriber.email,
            name: subscriber.name,
            status: SubscriberStatus::Active,
            source: SUBSCRIBER_SOURCE.to_string(),
            created_at: now,
            updated_at: now,
        };

        match self.subscribers.insert_one(&record).await {
            Ok(_) => Ok(record.into()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(record.email)),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_subscriber(&self, email: &str) -> Result<Option<NewsletterSubscriber>> {
        let record = self.subscribers.find_one(doc! { "email": email }).await?;
        Ok(record.map(NewsletterSubscriber::from))
    }

    async fn set_subscriber_status(
        &self,
        email: &str,
        status: SubscriberStatus,
    ) -> Result<Option<NewsletterSubscriber>> {
        let update = doc! {
            "$set": {
                "status": status.as_str(),
                "updatedAt": to_bson(Utc::now()),
            }
        };

        let record = self
            .subscribers
            .find_one_and_update(doc! { "email": email }, update)
            .with_options(return_updated())
            .await?;

        Ok(record.map(NewsletterSubscriber::from))
    }

    async fn list_subscribers(&self) -> Result<Vec<NewsletterSubscriber>> {
        find_all(&self.subscribers).await
    }

    async fn create_campaign(&self, campaign: NewCampaign) -> Result<NewsletterCampaign> {
        let now = to_bson(Utc::now());
        let record = CampaignRecord {
            id: ObjectId::new(),
            subject: campaign.subject,
            content: campaign.content,
            recipients: campaign.recipients,
            open_rate: 0.0,
            click_rate: 0.0,
            status: CampaignStatus::Draft,
            sent_at: None,
            created_at: now,
            updated_at: now,
        };

        self.campaigns.insert_one(&record).await?;

        Ok(record.into())
    }

    async fn mark_campaign_sent(
        &self,
        id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<NewsletterCampaign>> {
        let Some(oid) = parse_id(id) else {
            return Ok(None);
        };

        let update = doc! {
            "$set": {
                "status": CampaignStatus::Sent.as_str(),
                "sentAt": to_bson(sent_at),
                "recipients": 0_i64,
                "openRate": 0.0,
                "clickRate": 0.0,
                "updatedAt": to_bson(Utc::now()),
            }
        };

        let record = self
            .campaigns
            .find_one_and_update(doc! { "_id": oid }, update)
            .with_options(return_updated())
            .await?;

        Ok(record.map(NewsletterCampaign::from))
    }

    async fn list_campaigns(&self) -> Result<Vec<NewsletterCampaign>> {
        find_all(&self.campaigns).await
    }

    async fn count_leads(&self, kind: LeadKind, since: Option<DateTime<Utc>>) -> Result<u64> {
        let filter = match since {
            Some(since) => doc! { "createdAt": { "$gte": to_bson(since) } },
            None => doc! {},
        };

        Ok(self.lead_collection(kind).count_documents(filter).await?)
    }

    async fn count_active_subscribers(&self) -> Result<u64> {
        let filter = doc! { "status": SubscriberStatus::Active.as_str() };
        Ok(self.subscribers.count_documents(filter).await?)
    }

    async fn recent_leads(&self, kind: LeadKind, limit: usize) -> Result<Vec<RecentLead>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .limit(limit as i64)
            .projection(doc! { "name": 1, "email": 1, "createdAt": 1 })
            .build();

        let records: Vec<RecentRecord> = self
            .lead_collection(kind)
            .clone_with_type::<RecentRecord>()
            .find(doc! {})
            .with_options(options)
            .await?
            .try_collect()
            .await?;

        Ok(records
            .into_iter()
            .map(|r| RecentLead {
                id: r.id.to_hex(),
                kind,
                name: r.name,
                email: r.email,
                created_at: from_bson(r.created_at),
            })
            .collect())
    }

    async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bson_datetime_conversion_keeps_millis() {
        let now = DateTime::from_timestamp_millis(1_700_000_123_456).unwrap();
        assert_eq!(from_bson(to_bson(now)), now);
    }

    #[test]
    fn test_contact_record_defaults_for_legacy_documents() {
        let document = doc! {
            "_id": ObjectId::new(),
            "name": "Ada",
            "email": "ada@gmail.com",
            "message": "Hello",
            "createdAt": BsonDateTime::now(),
            "updatedAt": BsonDateTime::now(),
        };

        let record: ContactRecord = mongodb::bson::from_document(document).unwrap();
        let contact = Contact::from(record);
        assert_eq!(contact.phone, "");
        assert_eq!(contact.project_type, "residential");
        assert_eq!(contact.status, LeadStatus::New);
    }

    #[test]
    fn test_campaign_record_round_trips_through_bson() {
        let now = BsonDateTime::now();
        let record = CampaignRecord {
            id: ObjectId::new(),
            subject: "Spring palettes".to_string(),
            content: "New looks".to_string(),
            recipients: 0,
            open_rate: 0.0,
            click_rate: 0.0,
            status: CampaignStatus::Draft,
            sent_at: None,
            created_at: now,
            updated_at: now,
        };

        let document = mongodb::bson::to_document(&record).unwrap();
        assert_eq!(document.get_str("status").unwrap(), "draft");
        assert!(document.contains_key("openRate"));

        let back: CampaignRecord = mongodb::bson::from_document(document).unwrap();
        assert_eq!(back.subject, "Spring palettes");
        assert!(back.sent_at.is_none());
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("not-an-id").is_none());
        assert!(parse_id(&ObjectId::new().to_hex()).is_some());
    }
}

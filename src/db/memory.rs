//! In-memory [`LeadStore`] backing the handler tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::models::{
    CampaignStatus, Contact, LeadKind, LeadStatus, NewCampaign, NewContact, NewPopupSubmission,
    NewSubscriber, NewsletterCampaign, NewsletterSubscriber, PopupSubmission, RecentLead,
    SubscriberStatus, POPUP_SOURCE, SUBSCRIBER_SOURCE,
};
use super::{LeadStore, Result, StoreError};

#[derive(Default)]
pub struct InMemoryStore {
    contacts: RwLock<Vec<Contact>>,
    popups: RwLock<Vec<PopupSubmission>>,
    subscribers: RwLock<Vec<NewsletterSubscriber>>,
    campaigns: RwLock<Vec<NewsletterCampaign>>,
    offline: AtomicBool,
    #[cfg(test)]
    stale_subscriber_lookups: AtomicBool,
}

fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// Newest first; among equal timestamps the later insert wins.
fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = items.iter().rev().cloned().collect();
    out.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    out
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every operation fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes `find_subscriber` miss, as when another request inserts the
    /// same email between the lookup and the insert.
    #[cfg(test)]
    pub(crate) fn set_stale_subscriber_lookups(&self, stale: bool) {
        self.stale_subscriber_lookups.store(stale, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn stale_subscriber_lookups(&self) -> bool {
        self.stale_subscriber_lookups.load(Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn stale_subscriber_lookups(&self) -> bool {
        false
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }

    async fn recent_rows(&self, kind: LeadKind) -> Vec<RecentLead> {
        match kind {
            LeadKind::Contact => self
                .contacts
                .read()
                .await
                .iter()
                .map(|c| RecentLead {
                    id: c.id.clone(),
                    kind,
                    name: Some(c.name.clone()),
                    email: c.email.clone(),
                    created_at: c.created_at,
                })
                .collect(),
            LeadKind::Newsletter => self
                .subscribers
                .read()
                .await
                .iter()
                .map(|s| RecentLead {
                    id: s.id.clone(),
                    kind,
                    name: s.name.clone(),
                    email: s.email.clone(),
                    created_at: s.created_at,
                })
                .collect(),
            LeadKind::Popup => self
                .popups
                .read()
                .await
                .iter()
                .map(|p| RecentLead {
                    id: p.id.clone(),
                    kind,
                    name: Some(p.name.clone()),
                    email: p.email.clone(),
                    created_at: p.created_at,
                })
                .collect(),
        }
    }

    /// Rewrites the creation time of a stored lead.
    #[cfg(test)]
    pub(crate) async fn backdate(&self, kind: LeadKind, id: &str, created_at: DateTime<Utc>) {
        match kind {
            LeadKind::Contact => {
                if let Some(c) = self.contacts.write().await.iter_mut().find(|c| c.id == id) {
                    c.created_at = created_at;
                }
            }
            LeadKind::Newsletter => {
                if let Some(s) = self.subscribers.write().await.iter_mut().find(|s| s.id == id) {
                    s.created_at = created_at;
                }
            }
            LeadKind::Popup => {
                if let Some(p) = self.popups.write().await.iter_mut().find(|p| p.id == id) {
                    p.created_at = created_at;
                }
            }
        }
    }
}

#[async_trait]
impl LeadStore for InMemoryStore {
    async fn create_contact(&self, contact: NewContact) -> Result<Contact> {
        self.check_online()?;
        let now = Utc::now();
        let contact = Contact {
            id: new_id(),
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            message: contact.message,
            project_type: contact.project_type,
            status: LeadStatus::New,
            created_at: now,
            updated_at: now,
        };
        self.contacts.write().await.push(contact.clone());
        Ok(contact)
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>> {
        self.check_online()?;
        Ok(newest_first(self.contacts.read().await.as_slice(), |c| c.created_at))
    }

    async fn find_contact(&self, id: &str) -> Result<Option<Contact>> {
        self.check_online()?;
        Ok(self.contacts.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn set_contact_status(&self, id: &str, status: LeadStatus) -> Result<Option<Contact>> {
        self.check_online()?;
        let mut contacts = self.contacts.write().await;
        Ok(contacts.iter_mut().find(|c| c.id == id).map(|c| {
            c.status = status;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn create_popup(&self, popup: NewPopupSubmission) -> Result<PopupSubmission> {
        self.check_online()?;
        let now = Utc::now();
        let popup = PopupSubmission {
            id: new_id(),
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
        self.popups.write().await.push(popup.clone());
        Ok(popup)
    }

    async fn list_popups(&self) -> Result<Vec<PopupSubmission>> {
        self.check_online()?;
        Ok(newest_first(self.popups.read().await.as_slice(), |p| p.created_at))
    }

    async fn create_subscriber(&self, subscriber: NewSubscriber) -> Result<NewsletterSubscriber> {
        self.check_online()?;
        let mut subscribers = self.subscribers.write().await;
        if subscribers.iter().any(|s| s.email == subscriber.email) {
            return Err(StoreError::Duplicate(subscriber.email));
        }

        let now = Utc::now();
        let subscriber = NewsletterSubscriber {
            id: new_id(),
            email: subscriber.email,
            name: subscriber.name,
            status: SubscriberStatus::Active,
            source: SUBSCRIBER_SOURCE.to_string(),
            created_at: now,
            updated_at: now,
        };
        subscribers.push(subscriber.clone());
        Ok(subscriber)
    }

    async fn find_subscriber(&self, email: &str) -> Result<Option<NewsletterSubscriber>> {
        self.check_online()?;
        if self.stale_subscriber_lookups() {
            return Ok(None);
        }
        Ok(self
            .subscribers
            .read()
            .await
            .iter()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn set_subscriber_status(
        &self,
        email: &str,
        status: SubscriberStatus,
    ) -> Result<Option<NewsletterSubscriber>> {
        self.check_online()?;
        let mut subscribers = self.subscribers.write().await;
        Ok(subscribers.iter_mut().find(|s| s.email == email).map(|s| {
            s.status = status;
            s.updated_at = Utc::now();
            s.clone()
        }))
    }

    async fn list_subscribers(&self) -> Result<Vec<NewsletterSubscriber>> {
        self.check_online()?;
        Ok(newest_first(self.subscribers.read().await.as_slice(), |s| s.created_at))
    }

    async fn create_campaign(&self, campaign: NewCampaign) -> Result<NewsletterCampaign> {
        self.check_online()?;
        let now = Utc::now();
        let campaign = NewsletterCampaign {
            id: new_id(),
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
        self.campaigns.write().await.push(campaign.clone());
        Ok(campaign)
    }

    async fn mark_campaign_sent(
        &self,
        id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<NewsletterCampaign>> {
        self.check_online()?;
        let mut campaigns = self.campaigns.write().await;
        Ok(campaigns.iter_mut().find(|c| c.id == id).map(|c| {
            c.status = CampaignStatus::Sent;
            c.sent_at = Some(sent_at);
            c.recipients = 0;
            c.open_rate = 0.0;
            c.click_rate = 0.0;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn list_campaigns(&self) -> Result<Vec<NewsletterCampaign>> {
        self.check_online()?;
        Ok(newest_first(self.campaigns.read().await.as_slice(), |c| c.created_at))
    }

    async fn count_leads(&self, kind: LeadKind, since: Option<DateTime<Utc>>) -> Result<u64> {
        self.check_online()?;
        let rows = self.recent_rows(kind).await;
        let count = rows
            .iter()
            .filter(|r| since.map_or(true, |since| r.created_at >= since))
            .count();
        Ok(count as u64)
    }

    async fn count_active_subscribers(&self) -> Result<u64> {
        self.check_online()?;
        let count = self
            .subscribers
            .read()
            .await
            .iter()
            .filter(|s| s.status == SubscriberStatus::Active)
            .count();
        Ok(count as u64)
    }

    async fn recent_leads(&self, kind: LeadKind, limit: usize) -> Result<Vec<RecentLead>> {
        self.check_online()?;
        let rows = self.recent_rows(kind).await;
        let mut rows = newest_first(rows.as_slice(), |r| r.created_at);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        self.check_online()?;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn new_contact(name: &str) -> NewContact {
        NewContact {
            name: name.to_string(),
            email: format!("{}@gmail.com", name.to_lowercase()),
            phone: String::new(),
            message: "hello".to_string(),
            project_type: "residential".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = InMemoryStore::new();
        let first = store.create_contact(new_contact("First")).await.unwrap();
        let second = store.create_contact(new_contact("Second")).await.unwrap();

        let listed = store.list_contacts().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_duplicate_subscriber_email_is_rejected() {
        let store = InMemoryStore::new();
        let new = NewSubscriber {
            email: "x@yahoo.com".to_string(),
            name: None,
        };
        store.create_subscriber(new.clone()).await.unwrap();

        let err = store.create_subscriber(new).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(email) if email == "x@yahoo.com"));
    }

    #[tokio::test]
    async fn test_count_leads_since() {
        let store = InMemoryStore::new();
        let old = store.create_contact(new_contact("Old")).await.unwrap();
        store.create_contact(new_contact("Fresh")).await.unwrap();
        store
            .backdate(LeadKind::Contact, &old.id, Utc::now() - ChronoDuration::days(3))
            .await;

        let since = Utc::now() - ChronoDuration::hours(24);
        assert_eq!(store.count_leads(LeadKind::Contact, None).await.unwrap(), 2);
        assert_eq!(
            store.count_leads(LeadKind::Contact, Some(since)).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_recent_leads_respects_limit() {
        let store = InMemoryStore::new();
        for name in ["A", "B", "C"] {
            store.create_contact(new_contact(name)).await.unwrap();
        }

        let recent = store.recent_leads(LeadKind::Contact, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name.as_deref(), Some("C"));
        assert_eq!(recent[1].name.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let store = InMemoryStore::new();
        store.set_offline(true);

        assert!(matches!(
            store.list_contacts().await,
            Err(StoreError::Unavailable)
        ));
        assert!(store.ping().await.is_err());

        store.set_offline(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_mark_campaign_sent_unknown_id() {
        let store = InMemoryStore::new();
        let result = store
            .mark_campaign_sent(&new_id(), Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}

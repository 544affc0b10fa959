//! Customer bookkeeping, opportunity discovery and message drafting.
//!
//! # Invariants
//! - Opportunities found by the model are stored as `pending`.
//! - Drafted messages are stored as `autopilot` when the owner enabled it,
//!   otherwise as `draft`.
//! - Drafting for an opportunity marks it `processed`.
//! - A customer without notes yields no opportunities and no model call.

use crate::ai::{analyze_customer_notes, generate_styled_message, ChatModel, GenerationSettings};
use crate::model::customer::{Customer, CustomerId, CustomerNote, NewCustomer, NoteId};
use crate::model::outreach::{
    CommunicationOpportunity, Message, MessageId, MessageKind, MessageStatus, NewMessage,
    NewOpportunity, OpportunityId, OpportunityStatus,
};
use crate::model::user::{User, UserId};
use crate::repo::customer_repo::CustomerRepository;
use crate::repo::outreach_repo::{OpportunityListQuery, OutreachRepository};
use crate::repo::user_repo::UserRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Use-case service over users, customers and outreach storage.
pub struct OutreachService<U, C, O, M>
where
    U: UserRepository,
    C: CustomerRepository,
    O: OutreachRepository,
    M: ChatModel,
{
    users: U,
    customers: C,
    outreach: O,
    model: M,
    settings: GenerationSettings,
}

impl<U, C, O, M> OutreachService<U, C, O, M>
where
    U: UserRepository,
    C: CustomerRepository,
    O: OutreachRepository,
    M: ChatModel,
{
    pub fn new(users: U, customers: C, outreach: O, model: M, settings: GenerationSettings) -> Self {
        Self {
            users,
            customers,
            outreach,
            model,
            settings,
        }
    }

    /// Creates a customer for an existing user and returns the stored row.
    pub fn add_customer(&self, customer: &NewCustomer) -> ServiceResult<Customer> {
        self.load_user(customer.user_id)?;
        let customer_id = self.customers.create_customer(customer)?;
        info!(
            "event=customer_add module=service status=ok user_id={} customer_id={customer_id}",
            customer.user_id
        );
        self.customers
            .get_customer(customer_id)?
            .ok_or(ServiceError::InconsistentState(
                "created customer not found in read-back",
            ))
    }

    pub fn list_customers(&self, user_id: UserId) -> ServiceResult<Vec<Customer>> {
        Ok(self.customers.list_customers(user_id)?)
    }

    pub fn add_note(&self, customer_id: CustomerId, content: &str) -> ServiceResult<NoteId> {
        if content.trim().is_empty() {
            return Err(ServiceError::InvalidInput("note must not be blank"));
        }
        Ok(self.customers.add_note(customer_id, content)?)
    }

    pub fn list_notes(&self, customer_id: CustomerId) -> ServiceResult<Vec<CustomerNote>> {
        Ok(self.customers.list_notes(customer_id)?)
    }

    /// Asks the model for reasons to reach out and stores them as pending.
    ///
    /// A suggestion matching an already pending trigger reuses that row.
    /// Returns the stored opportunities, most important first.
    pub fn find_opportunities(
        &self,
        customer_id: CustomerId,
    ) -> ServiceResult<Vec<CommunicationOpportunity>> {
        let customer = self.load_customer(customer_id)?;
        let notes = self.customers.list_notes(customer_id)?;
        if notes.is_empty() {
            info!(
                "event=opportunity_find module=service status=skipped customer_id={customer_id} reason=no_notes"
            );
            return Ok(Vec::new());
        }

        let report =
            analyze_customer_notes(&self.model, &self.settings, &customer.name, &notes)?;

        let drafts: Vec<NewOpportunity> = report
            .opportunities
            .into_iter()
            .map(|suggestion| NewOpportunity {
                customer_id,
                trigger: suggestion.trigger,
                timing: suggestion.timing,
                medium: suggestion.medium,
                reference: suggestion.reference,
                importance: suggestion.importance,
                status: OpportunityStatus::Pending,
            })
            .collect();
        let ids = self.outreach.record_opportunities(&drafts)?;
        info!(
            "event=opportunity_find module=service status=ok customer_id={customer_id} found={}",
            ids.len()
        );

        let mut stored = self.outreach.list_opportunities(&OpportunityListQuery {
            customer_id: Some(customer_id),
            status: Some(OpportunityStatus::Pending),
            limit: None,
        })?;
        stored.retain(|opportunity| ids.contains(&opportunity.id));
        Ok(stored)
    }

    pub fn list_opportunities(
        &self,
        query: &OpportunityListQuery,
    ) -> ServiceResult<Vec<CommunicationOpportunity>> {
        Ok(self.outreach.list_opportunities(query)?)
    }

    /// Drafts and stores a message to a customer in the owner's voice.
    pub fn draft_message(
        &self,
        customer_id: CustomerId,
        kind: MessageKind,
        reference: Option<&str>,
    ) -> ServiceResult<Message> {
        let customer = self.load_customer(customer_id)?;
        self.draft_for_customer(&customer, kind, reference)
    }

    /// Drafts a message for a stored opportunity and marks it processed.
    pub fn draft_for_opportunity(&self, opportunity_id: OpportunityId) -> ServiceResult<Message> {
        let opportunity = self
            .outreach
            .get_opportunity(opportunity_id)?
            .ok_or(ServiceError::NotFound {
                entity: "opportunity",
                id: opportunity_id,
            })?;
        if opportunity.status != OpportunityStatus::Pending {
            return Err(ServiceError::InvalidInput("opportunity is no longer pending"));
        }

        let customer = self.load_customer(opportunity.customer_id)?;
        let message = self.draft_for_customer(
            &customer,
            opportunity.medium,
            Some(opportunity.reference.as_str()),
        )?;
        self.outreach
            .update_opportunity_status(opportunity_id, OpportunityStatus::Processed)?;
        Ok(message)
    }

    pub fn dismiss_opportunity(&self, opportunity_id: OpportunityId) -> ServiceResult<()> {
        Ok(self
            .outreach
            .update_opportunity_status(opportunity_id, OpportunityStatus::Dismissed)?)
    }

    pub fn list_messages(&self, customer_id: CustomerId) -> ServiceResult<Vec<Message>> {
        Ok(self.outreach.list_messages(customer_id)?)
    }

    pub fn set_message_status(
        &self,
        message_id: MessageId,
        status: MessageStatus,
    ) -> ServiceResult<()> {
        Ok(self.outreach.update_message_status(message_id, status)?)
    }

    fn draft_for_customer(
        &self,
        customer: &Customer,
        kind: MessageKind,
        reference: Option<&str>,
    ) -> ServiceResult<Message> {
        let owner = self.load_user(customer.user_id)?;
        let profile = owner
            .style_profile()
            .ok_or(ServiceError::NotTrained(owner.id))?;
        let notes = self.customers.list_notes(customer.id)?;

        let content = generate_styled_message(
            &self.model,
            &self.settings,
            &profile,
            &customer.name,
            &notes,
            kind,
            reference,
        )?;

        let status = if owner.autopilot_enabled {
            MessageStatus::Autopilot
        } else {
            MessageStatus::Draft
        };
        let message_id = self.outreach.create_message(&NewMessage {
            customer_id: customer.id,
            content: content.trim().to_string(),
            kind,
            status,
        })?;
        info!(
            "event=message_draft module=service status=ok customer_id={} message_id={message_id} kind={kind} message_status={}",
            customer.id,
            status.as_str()
        );

        self.outreach
            .get_message(message_id)?
            .ok_or(ServiceError::InconsistentState(
                "drafted message not found in read-back",
            ))
    }

    fn load_user(&self, user_id: UserId) -> ServiceResult<User> {
        self.users.get_user(user_id)?.ok_or(ServiceError::NotFound {
            entity: "user",
            id: user_id,
        })
    }

    fn load_customer(&self, customer_id: CustomerId) -> ServiceResult<Customer> {
        self.customers
            .get_customer(customer_id)?
            .ok_or(ServiceError::NotFound {
                entity: "customer",
                id: customer_id,
            })
    }
}

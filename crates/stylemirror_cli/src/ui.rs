//! Interactive flows: style training, style testing and client outreach.
//!
//! Every prompt is blocking; model calls show a spinner until they return.

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use std::time::Duration;
use stylemirror_core::{
    questions_for, ChatModel, CommunicationOpportunity, Customer, GenerationSettings, MessageKind,
    NewCustomer, OutreachService, SqliteCustomerRepository, SqliteOutreachRepository,
    SqliteUserRepository, StyleService, TrainingSample, User, UserRepository,
};

const EXIT_COMMAND: &str = "exit";

type Style<'a, M> = StyleService<SqliteUserRepository<'a>, &'a M>;
type Outreach<'a, M> = OutreachService<
    SqliteUserRepository<'a>,
    SqliteCustomerRepository<'a>,
    SqliteOutreachRepository<'a>,
    &'a M,
>;

struct Session<'a, M: ChatModel> {
    style: Style<'a, M>,
    outreach: Outreach<'a, M>,
    user: User,
}

/// Runs the whole interactive session until the user exits.
pub fn run<M: ChatModel>(
    conn: &Connection,
    model: &M,
    settings: &GenerationSettings,
) -> Result<()> {
    println!("Professional Style Learning System");
    println!("==================================");

    let style = StyleService::new(SqliteUserRepository::new(conn), model, settings.clone());
    let outreach = OutreachService::new(
        SqliteUserRepository::new(conn),
        SqliteCustomerRepository::new(conn),
        SqliteOutreachRepository::new(conn),
        model,
        settings.clone(),
    );

    let user = choose_user(conn, &style)?;
    let mut session = Session {
        style,
        outreach,
        user,
    };

    if session.user.style_analysis.is_none() {
        train_style(&mut session)?;
    }

    main_menu(&mut session)
}

fn choose_user<M: ChatModel>(conn: &Connection, style: &Style<'_, M>) -> Result<User> {
    let users = SqliteUserRepository::new(conn).list_users()?;
    if !users.is_empty() {
        let mut items: Vec<String> = users
            .iter()
            .map(|user| format!("{} ({})", user.name, user.profession))
            .collect();
        items.push("Create a new profile".to_string());

        let selection = Select::new()
            .with_prompt("Choose your profile")
            .items(&items)
            .default(0)
            .interact()?;
        if let Some(user) = users.into_iter().nth(selection) {
            return Ok(user);
        }
    }

    let name: String = Input::new().with_prompt("What is your name?").interact_text()?;
    let profession: String = Input::new()
        .with_prompt("What is your profession? (e.g., doctor, therapist, realtor)")
        .interact_text()?;
    Ok(style.register_user(&name, &profession)?)
}

fn train_style<M: ChatModel>(session: &mut Session<'_, M>) -> Result<()> {
    let questions = questions_for(&session.user.profession);
    println!(
        "\nWe'll now ask you {} questions to learn your communication style.",
        questions.len()
    );
    println!("Please respond as you naturally would in a professional context.\n");

    let mut samples = Vec::with_capacity(questions.len());
    for (index, question) in questions.iter().enumerate() {
        println!("Question {}:", index + 1);
        println!("{question}");
        let response: String = Input::new().with_prompt("Your response").interact_text()?;
        samples.push(TrainingSample::new(*question, response));
        println!();
    }

    let analysis = with_spinner("Analyzing your communication style...", || {
        session.style.train(session.user.id, &samples)
    })?;
    println!("\nStyle Analysis:");
    println!("{analysis}");

    session.user = session.style.get_user(session.user.id)?;
    Ok(())
}

fn main_menu<M: ChatModel>(session: &mut Session<'_, M>) -> Result<()> {
    loop {
        let autopilot_label = if session.user.autopilot_enabled {
            "Turn autopilot off"
        } else {
            "Turn autopilot on"
        };
        let items = [
            "Test my style",
            "Add a customer",
            "Add a note about a customer",
            "Find reasons to reach out",
            "Draft a message",
            "Retrain my style",
            autopilot_label,
            "Exit",
        ];
        let selection = Select::new()
            .with_prompt(format!("Signed in as {}", session.user.name))
            .items(&items)
            .default(0)
            .interact()?;

        match selection {
            0 => test_style(session)?,
            1 => add_customer(session)?,
            2 => add_note(session)?,
            3 => find_opportunities(session)?,
            4 => draft_message(session)?,
            5 => train_style(session)?,
            6 => {
                let enabled = !session.user.autopilot_enabled;
                session.style.set_autopilot(session.user.id, enabled)?;
                session.user.autopilot_enabled = enabled;
                println!("Autopilot is now {}.", if enabled { "on" } else { "off" });
            }
            _ => break,
        }
    }
    Ok(())
}

fn test_style<M: ChatModel>(session: &Session<'_, M>) -> Result<()> {
    loop {
        println!("\nTest if the system has learned your style.");
        println!("Enter a question that a client might ask you (or type '{EXIT_COMMAND}' to quit):");
        let question: String = Input::new().with_prompt(">").interact_text()?;
        if question.trim().eq_ignore_ascii_case(EXIT_COMMAND) {
            return Ok(());
        }

        let answer = with_spinner("Writing in your style...", || {
            session.style.respond(session.user.id, &question)
        })?;
        println!("\nGenerated response in your style:");
        println!("{answer}");

        let sounds_right = Confirm::new()
            .with_prompt("Does this sound like your style?")
            .default(true)
            .interact()?;
        if !sounds_right {
            println!("Thank you for the feedback. This helps improve the system.");
        }
    }
}

fn add_customer<M: ChatModel>(session: &Session<'_, M>) -> Result<()> {
    let name: String = Input::new().with_prompt("Customer name").interact_text()?;
    let phone = optional_input("Phone (optional)")?;
    let email = optional_input("Email (optional)")?;

    let mut draft = NewCustomer::new(session.user.id, name);
    if let Some(phone) = phone {
        draft = draft.with_phone(phone);
    }
    if let Some(email) = email {
        draft = draft.with_email(email);
    }

    let customer = session.outreach.add_customer(&draft)?;
    println!("Added {}.", customer.name);
    Ok(())
}

fn add_note<M: ChatModel>(session: &Session<'_, M>) -> Result<()> {
    let Some(customer) = pick_customer(session)? else {
        return Ok(());
    };
    let note: String = Input::new()
        .with_prompt(format!("Note about {}", customer.name))
        .interact_text()?;
    session.outreach.add_note(customer.id, &note)?;
    println!("Note saved.");
    Ok(())
}

fn find_opportunities<M: ChatModel>(session: &Session<'_, M>) -> Result<()> {
    let Some(customer) = pick_customer(session)? else {
        return Ok(());
    };

    let found = with_spinner("Reading your notes...", || {
        session.outreach.find_opportunities(customer.id)
    })?;
    if found.is_empty() {
        println!("No good reasons to reach out to {} right now.", customer.name);
        return Ok(());
    }

    let mut items: Vec<String> = found.iter().map(describe_opportunity).collect();
    items.push("Not now".to_string());
    let selection = Select::new()
        .with_prompt("Draft a message for one of these?")
        .items(&items)
        .default(0)
        .interact()?;

    if let Some(opportunity) = found.get(selection) {
        let message = with_spinner("Drafting...", || {
            session.outreach.draft_for_opportunity(opportunity.id)
        })?;
        print_draft(&customer, message.kind, message.status.as_str(), &message.content);
    }
    Ok(())
}

fn draft_message<M: ChatModel>(session: &Session<'_, M>) -> Result<()> {
    let Some(customer) = pick_customer(session)? else {
        return Ok(());
    };

    let kinds = [MessageKind::Sms, MessageKind::Email];
    let labels = ["SMS", "Email"];
    let kind_index = Select::new()
        .with_prompt("Message type")
        .items(&labels)
        .default(0)
        .interact()?;
    let kind = kinds[kind_index];
    let reference = optional_input("Detail to mention (optional)")?;

    let message = with_spinner("Drafting...", || {
        session
            .outreach
            .draft_message(customer.id, kind, reference.as_deref())
    })?;
    print_draft(&customer, message.kind, message.status.as_str(), &message.content);
    Ok(())
}

fn pick_customer<M: ChatModel>(session: &Session<'_, M>) -> Result<Option<Customer>> {
    let customers = session.outreach.list_customers(session.user.id)?;
    if customers.is_empty() {
        println!("Add a customer first.");
        return Ok(None);
    }

    let items: Vec<&str> = customers
        .iter()
        .map(|customer| customer.name.as_str())
        .collect();
    let selection = Select::new()
        .with_prompt("Customer")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(customers.into_iter().nth(selection))
}

fn optional_input(prompt: &str) -> Result<Option<String>> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let trimmed = value.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

fn describe_opportunity(opportunity: &CommunicationOpportunity) -> String {
    format!(
        "[{}/10] {} ({}, {}) - {}",
        opportunity.importance,
        opportunity.trigger,
        opportunity.timing,
        opportunity.medium,
        opportunity.reference
    )
}

fn print_draft(customer: &Customer, kind: MessageKind, status: &str, content: &str) {
    println!("\n{} to {} [{status}]:", kind.as_str().to_uppercase(), customer.name);
    println!("{content}");
}

fn with_spinner<T, E>(message: &'static str, task: impl FnOnce() -> Result<T, E>) -> Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = task();
    spinner.finish_and_clear();
    Ok(result?)
}

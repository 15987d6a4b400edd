use chrono::NaiveDate;
use colored::Colorize;
use dialoguer::{Confirm, Select};
use tokio::runtime::Runtime;
use zeroize::Zeroizing;

use crate::dates::DatePattern;
use crate::error::{ConvertError, Result};
use crate::models::CanonicalRecord;
use crate::settings::{load_upload_config, save_upload_config, SavedAccount, UploadConfig};
use crate::upload::{build_transactions, YnabClient};

const REFRESH_ITEM: &str = "[YNAB] >> REFRESH ACCOUNTS";
const TOKEN_URL: &str = "https://app.youneedabudget.com/settings/developer";

fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Ask for a personal access token until the API accepts one. An empty answer
/// cancels.
fn ask_for_token(rt: &Runtime) -> Result<Option<String>> {
    println!("To upload to YNAB a Personal Access Token is needed.");
    println!("Create one at {TOKEN_URL}");
    loop {
        let input = Zeroizing::new(rpassword::prompt_password("Personal Access Token: ")?);
        let token = input.trim();
        if token.is_empty() {
            return Ok(None);
        }
        let client = YnabClient::new(token)?;
        match rt.block_on(client.verify_token()) {
            Ok(()) => return Ok(Some(token.to_string())),
            Err(e) => println!("{}", e.to_string().red()),
        }
    }
}

fn account_label(account: &SavedAccount) -> String {
    format!("[{}] {}", account.budget_name, account.account_name)
}

/// Pick the target account. The first entry re-fetches the account list from
/// YNAB and stores it in the config file.
fn select_account(
    rt: &Runtime,
    client: &YnabClient,
    config: &mut UploadConfig,
) -> Result<Option<SavedAccount>> {
    loop {
        let mut items = vec![REFRESH_ITEM.to_string()];
        items.extend(config.accounts.iter().map(account_label));

        let choice = Select::new()
            .with_prompt("Which account do you want to upload to?")
            .items(&items)
            .default(if config.accounts.is_empty() { 0 } else { 1 })
            .interact_opt()
            .map_err(|e| ConvertError::Upload(e.to_string()))?;

        match choice {
            None => return Ok(None),
            Some(0) => {
                config.accounts = rt.block_on(client.accounts())?;
                save_upload_config(config)?;
                println!("{} accounts found", config.accounts.len());
            }
            Some(i) => return Ok(config.accounts.get(i - 1).cloned()),
        }
    }
}

/// Interactively upload converted records to a YNAB account. Nothing here
/// touches the local output of the conversion.
pub fn run(
    records: &[CanonicalRecord],
    date_format: &DatePattern,
    label: &str,
    today: NaiveDate,
) -> Result<()> {
    if records.is_empty() {
        println!("{}", format!("No transactions to upload from {label}").yellow());
        return Ok(());
    }
    let rt = runtime()?;

    let mut config = load_upload_config();
    if config.access_token.is_empty() {
        let Some(token) = ask_for_token(&rt)? else {
            println!("{}", "Upload cancelled.".yellow());
            return Ok(());
        };
        config = UploadConfig {
            access_token: token,
            accounts: Vec::new(),
        };
        save_upload_config(&config)?;
    }

    let confirmed = Confirm::new()
        .with_prompt(format!("Upload the contents of '{label}' to YNAB?"))
        .default(false)
        .interact()
        .unwrap_or(false);
    if !confirmed {
        return Ok(());
    }

    let client = YnabClient::new(&config.access_token)?;
    let Some(account) = select_account(&rt, &client, &mut config)? else {
        println!("{}", "Upload cancelled.".yellow());
        return Ok(());
    };

    let transactions = build_transactions(records, date_format, &account.account_id, today);
    rt.block_on(client.create_transactions(&account.budget_id, &transactions))?;
    println!(
        "{}",
        format!(
            "{} transactions uploaded to {}",
            transactions.len(),
            account_label(&account)
        )
        .green()
    );
    Ok(())
}

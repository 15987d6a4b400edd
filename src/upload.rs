use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::DatePattern;
use crate::error::{ConvertError, Result};
use crate::fmt::parse_amount;
use crate::models::CanonicalRecord;
use crate::settings::SavedAccount;

pub const API_URL: &str = "https://api.youneedabudget.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MEMO_LIMIT: usize = 200;

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveTransaction {
    pub account_id: String,
    pub date: String,
    /// Milliunits: 1.50 -> 1500, outflows negative.
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub cleared: &'static str,
    pub approved: bool,
    pub import_id: String,
}

fn milliunits(raw: &str) -> Option<i64> {
    parse_amount(raw).and_then(|d| (d * Decimal::from(1000)).floor().to_i64())
}

fn signed_milliunits(record: &CanonicalRecord) -> i64 {
    if !record.inflow.is_empty() {
        return milliunits(&record.inflow).unwrap_or(0);
    }
    if !record.outflow.is_empty() {
        return parse_amount(&record.outflow)
            .and_then(|d| (-d * Decimal::from(1000)).floor().to_i64())
            .unwrap_or(0);
    }
    0
}

/// Build the API payload. Import ids are `YNAB:<amount>:<date>:<n>`, where `n`
/// counts repeats of the same amount and date within the batch, so re-uploading
/// the same file does not create duplicates.
pub fn build_transactions(
    records: &[CanonicalRecord],
    date_format: &DatePattern,
    account_id: &str,
    today: NaiveDate,
) -> Vec<SaveTransaction> {
    let iso = DatePattern::new("YYYY-MM-DD");
    let mut occurrences: HashMap<String, usize> = HashMap::new();

    records
        .iter()
        .map(|record| {
            let date = date_format.parse_lenient(&record.date).unwrap_or(today);
            let date = iso.format(date);
            let amount = signed_milliunits(record);

            let partial = format!("YNAB:{amount}:{date}");
            let count = occurrences.entry(partial.clone()).or_insert(0);
            *count += 1;
            let import_id = format!("{partial}:{count}");

            let memo: String = record.memo.chars().take(MEMO_LIMIT).collect();
            SaveTransaction {
                account_id: account_id.to_string(),
                date,
                amount,
                payee_name: (!record.payee.is_empty()).then(|| record.payee.clone()),
                memo: (!memo.is_empty()).then_some(memo),
                cleared: "cleared",
                approved: false,
                import_id,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// API client
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    detail: String,
}

#[derive(Deserialize)]
struct Budget {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct BudgetList {
    budgets: Vec<Budget>,
}

#[derive(Deserialize)]
struct Account {
    id: String,
    name: String,
    #[serde(default)]
    closed: bool,
}

#[derive(Deserialize)]
struct AccountList {
    accounts: Vec<Account>,
}

#[derive(Serialize)]
struct SaveTransactions<'a> {
    transactions: &'a [SaveTransaction],
}

pub struct YnabClient {
    http: reqwest::Client,
    base_url: String,
}

impl YnabClient {
    pub fn new(access_token: &str) -> Result<Self> {
        Self::with_base_url(access_token, API_URL)
    }

    pub fn with_base_url(access_token: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| ConvertError::Upload("Access token is not valid".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConvertError::Upload(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ConvertError::Upload("Access token is not valid".to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.detail)
            .unwrap_or(body);
        Err(ConvertError::Upload(format!("{status}: {detail}")))
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| ConvertError::Upload(e.to_string()))?;
        let envelope: Envelope<T> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ConvertError::Upload(e.to_string()))?;
        Ok(envelope.data)
    }

    pub async fn verify_token(&self) -> Result<()> {
        self.get::<serde_json::Value>("/user").await.map(|_| ())
    }

    /// Every open account across every budget.
    pub async fn accounts(&self) -> Result<Vec<SavedAccount>> {
        let budgets: BudgetList = self.get("/budgets").await?;
        let mut accounts = Vec::new();
        for budget in budgets.budgets {
            let list: AccountList = self.get(&format!("/budgets/{}/accounts", budget.id)).await?;
            accounts.extend(list.accounts.into_iter().filter(|a| !a.closed).map(|a| SavedAccount {
                account_name: a.name,
                account_id: a.id,
                budget_name: budget.name.clone(),
                budget_id: budget.id.clone(),
            }));
        }
        tracing::debug!("fetched {} accounts", accounts.len());
        Ok(accounts)
    }

    pub async fn create_transactions(
        &self,
        budget_id: &str,
        transactions: &[SaveTransaction],
    ) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/budgets/{budget_id}/transactions", self.base_url))
            .json(&SaveTransactions { transactions })
            .send()
            .await
            .map_err(|e| ConvertError::Upload(e.to_string()))?;
        Self::check(response).await?;
        tracing::info!("uploaded {} transactions to budget {budget_id}", transactions.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn record(date: &str, payee: &str, outflow: &str, inflow: &str) -> CanonicalRecord {
        CanonicalRecord {
            date: date.to_string(),
            payee: payee.to_string(),
            memo: "memo".to_string(),
            outflow: outflow.to_string(),
            inflow: inflow.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_amounts_in_milliunits() {
        let fmt = DatePattern::new("DD/MM/YYYY");
        let txs = build_transactions(
            &[
                record("01/01/2023", "", "50", ""),
                record("01/01/2023", "", "", "12.345"),
                record("01/01/2023", "", "1.005", ""),
                record("01/01/2023", "", "", ""),
            ],
            &fmt,
            "acc",
            today(),
        );
        let amounts: Vec<i64> = txs.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![-50000, 12345, -1005, 0]);
    }

    #[test]
    fn test_import_ids_count_repeats() {
        let fmt = DatePattern::new("DD/MM/YYYY");
        let txs = build_transactions(
            &[
                record("01/01/2023", "", "5", ""),
                record("01/01/2023", "", "5", ""),
                record("02/01/2023", "", "5", ""),
                record("01/01/2023", "", "5", ""),
            ],
            &fmt,
            "acc",
            today(),
        );
        let ids: Vec<&str> = txs.iter().map(|t| t.import_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "YNAB:-5000:2023-01-01:1",
                "YNAB:-5000:2023-01-01:2",
                "YNAB:-5000:2023-01-02:1",
                "YNAB:-5000:2023-01-01:3",
            ]
        );
    }

    #[test]
    fn test_payload_fields() {
        let fmt = DatePattern::new("MM/DD/YYYY");
        let mut r = record("12/31/2023", "Uber", "", "10");
        r.memo = "x".repeat(250);
        let txs = build_transactions(&[r, record("", "", "1", "")], &fmt, "acc-1", today());
        assert_eq!(txs[0].date, "2023-12-31");
        assert_eq!(txs[0].payee_name.as_deref(), Some("Uber"));
        assert_eq!(txs[0].memo.as_ref().map(|m| m.len()), Some(200));
        assert_eq!(txs[0].account_id, "acc-1");
        assert!(!txs[0].approved);
        assert_eq!(txs[1].date, "2024-06-30");
        assert_eq!(txs[1].payee_name, None);

        let json = serde_json::to_value(&txs[1]).unwrap();
        assert_eq!(json["cleared"], "cleared");
        assert!(json.get("payee_name").is_none());
    }
}

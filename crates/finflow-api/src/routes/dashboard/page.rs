//! Dashboard page rendering
//!
//! Endpoints:
//! - page_dashboard: Full dashboard page
//!
//! Helper functions:
//! - render_panel: Stat cards, breakdown chart and transaction table (also the HTMX partial)
//! - render_upload_card: Statement upload form
//! - render_unavailable: Shown when the session cannot be verified

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use finflow_config::Config;
use finflow_core::{DashboardEntry, DashboardView, Metrics, Transaction, UploadRelay, ViewScope};
use finflow_utils::{escape_html, format_money};
use rust_decimal::Decimal;

use super::api::enter_dashboard;
use super::TRANSACTIONS_CHANGED;
use crate::session::signin_redirect;
use crate::AppState;

const INCOME_COLOR: &str = "#10b981";
const EXPENSE_COLOR: &str = "#ef4444";

/// Dashboard page: guard, load, aggregate, render
pub async fn page_dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // Dropping the handle with the request cancels an unfinished load
    let (_handle, scope) = ViewScope::new();

    match enter_dashboard(&state, &headers, &scope).await {
        DashboardEntry::SignInRequired => signin_redirect(&state.config, &headers),
        DashboardEntry::Unavailable(_) => render_unavailable(&headers),
        DashboardEntry::Ready(view) => {
            let inner_content = format!(
                r#"<div class='flex items-center justify-between mb-6'>
                <h2 class='text-2xl font-bold'>Dashboard</h2>
                <p class='text-sm text-gray-500'>Signed in as {}</p>
            </div>
            {}
            {}"#,
                escape_html(view.session.display_name()),
                render_upload_card(&state.upload),
                render_panel(&state.config, &view)
            );
            let nav = crate::app_nav(view.session.display_name());
            Html(crate::page_response(&headers, "Dashboard", &nav, &inner_content)).into_response()
        }
    }
}

/// 503 page; the visitor may still be signed in, so no redirect
pub fn render_unavailable(headers: &HeaderMap) -> Response {
    let inner_content = r#"<div role='alert' class='max-w-lg mx-auto mt-12 bg-white rounded-xl shadow-sm p-8 text-center'>
            <h2 class='text-xl font-bold mb-2'>Service unavailable</h2>
            <p class='text-gray-600 mb-6'>We couldn't verify your session right now. Please try again in a moment.</p>
            <a href='/dashboard' class='px-4 py-2 bg-emerald-600 text-white rounded-lg'>Retry</a>
        </div>"#;
    let html = crate::page_response(headers, "Service unavailable", &crate::public_nav(), inner_content);
    (StatusCode::SERVICE_UNAVAILABLE, Html(html)).into_response()
}

fn money(config: &Config, amount: Decimal) -> String {
    format_money(amount, &config.currency.symbol, config.currency.decimal_places)
}

/// Everything derived from the transaction list; re-fetched after an upload
pub fn render_panel(config: &Config, view: &DashboardView) -> String {
    let metrics = view.metrics();
    format!(
        r#"<div id='transactions-panel' hx-get='/dashboard/transactions' hx-trigger='{} from:body' hx-swap='outerHTML'>
        {}
        <div class='grid grid-cols-1 lg:grid-cols-3 gap-6'>
            <div class='bg-white rounded-xl shadow-sm p-6'>
                <h3 class='text-lg font-semibold mb-4'>Income vs Expenses</h3>
                {}
            </div>
            <div class='bg-white rounded-xl shadow-sm p-6 lg:col-span-2'>
                <h3 class='text-lg font-semibold mb-4'>Transactions</h3>
                {}
            </div>
        </div>
    </div>"#,
        TRANSACTIONS_CHANGED,
        render_stat_cards(config, &metrics),
        render_breakdown_chart(config, &metrics),
        render_transactions_table(config, &view.transactions)
    )
}

fn render_stat_cards(config: &Config, metrics: &Metrics) -> String {
    let balance = metrics.balance();
    let balance_class = if balance.is_sign_negative() && !balance.is_zero() {
        "text-red-700"
    } else {
        "text-indigo-700"
    };
    format!(
        r#"<div class='grid grid-cols-1 md:grid-cols-3 gap-4 mb-6'>
            <div class='bg-green-50 p-4 rounded-lg border border-green-200'><p class='text-sm text-green-600'>Total Income</p><p class='text-2xl font-bold text-green-700'>{}</p></div>
            <div class='bg-red-50 p-4 rounded-lg border border-red-200'><p class='text-sm text-red-600'>Total Expenses</p><p class='text-2xl font-bold text-red-700'>{}</p></div>
            <div class='bg-indigo-50 p-4 rounded-lg border border-indigo-200'><p class='text-sm text-indigo-600'>Net Balance</p><p class='text-2xl font-bold {}'>{}</p></div>
        </div>"#,
        money(config, metrics.income()),
        money(config, metrics.expenses()),
        balance_class,
        money(config, balance)
    )
}

/// Donut chart drawn with a CSS conic gradient
fn render_breakdown_chart(config: &Config, metrics: &Metrics) -> String {
    let [income, expenses] = metrics.breakdown();
    let gradient = if income.percentage == 0.0 && expenses.percentage == 0.0 {
        "#e5e7eb 0 100%".to_string()
    } else {
        format!(
            "{} 0 {:.1}%, {} {:.1}% 100%",
            INCOME_COLOR, income.percentage, EXPENSE_COLOR, income.percentage
        )
    };

    let legend: String = [(&income, INCOME_COLOR), (&expenses, EXPENSE_COLOR)]
        .iter()
        .map(|(slice, color)| {
            format!(
                "<li class='flex items-center justify-between py-1'><span class='flex items-center gap-2'><span class='inline-block w-3 h-3 rounded-full' style='background:{}'></span>{}</span><span class='font-medium'>{} <span class='text-gray-500 text-sm'>({:.1}%)</span></span></li>",
                color,
                slice.label,
                money(config, slice.amount),
                slice.percentage
            )
        })
        .collect();

    format!(
        r#"<div class='flex flex-col items-center gap-4'>
            <div class='relative w-40 h-40 rounded-full' style='background: conic-gradient({})'>
                <div class='absolute inset-6 bg-white rounded-full'></div>
            </div>
            <ul class='w-full text-sm'>{}</ul>
        </div>"#,
        gradient, legend
    )
}

fn render_transactions_table(config: &Config, transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "<p class='text-gray-500 text-center py-8'>No transactions yet. Upload a bank statement to get started.</p>".to_string();
    }

    let rows: String = transactions
        .iter()
        .map(|tx| {
            let (badge, amount_class) = if tx.is_income() {
                ("bg-green-100 text-green-700", "text-green-700")
            } else {
                ("bg-red-100 text-red-700", "text-red-700")
            };
            format!(
                r#"<tr class='border-b hover:bg-gray-50'>
                    <td class='py-2 pr-4 whitespace-nowrap'>{}</td>
                    <td class='py-2 pr-4'>{}</td>
                    <td class='py-2 pr-4'>{}</td>
                    <td class='py-2 pr-4'><span class='px-2 py-0.5 rounded text-xs {}'>{}</span></td>
                    <td class='py-2 text-right font-medium {}'>{}</td>
                </tr>"#,
                tx.date.format("%Y-%m-%d"),
                escape_html(&tx.description),
                escape_html(&tx.category),
                badge,
                tx.kind,
                amount_class,
                money(config, tx.amount)
            )
        })
        .collect();

    format!(
        r#"<div class='overflow-x-auto'>
            <table class='w-full text-sm'>
                <thead><tr class='text-left text-gray-500 border-b'>
                    <th class='py-2 pr-4'>Date</th><th class='py-2 pr-4'>Description</th><th class='py-2 pr-4'>Category</th><th class='py-2 pr-4'>Type</th><th class='py-2 text-right'>Amount</th>
                </tr></thead>
                <tbody>{}</tbody>
            </table>
        </div>"#,
        rows
    )
}

/// Upload form; the button stays disabled while the request runs
pub fn render_upload_card(relay: &UploadRelay) -> String {
    format!(
        r#"<div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <h3 class='text-lg font-semibold mb-4'>Upload bank statement</h3>
            <form hx-post='/dashboard/upload' hx-encoding='multipart/form-data' hx-target='#upload-result' hx-swap='innerHTML'
                hx-disabled-elt='#upload-button' hx-indicator='#upload-indicator' class='flex flex-wrap items-center gap-4'>
                <input type='file' name='file' accept='{}' required class='text-sm'>
                <button id='upload-button' type='submit' class='px-4 py-2 bg-emerald-600 text-white rounded-lg hover:bg-emerald-700 disabled:opacity-50'>Upload</button>
                <span id='upload-indicator' class='htmx-indicator text-sm text-gray-500'>Uploading...</span>
            </form>
            <div id='upload-result' class='mt-4'></div>
        </div>"#,
        escape_html(&relay.accept_attribute())
    )
}

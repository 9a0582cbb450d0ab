use crate::budgets::{BudgetAlert, BudgetView};
use crate::categories::ResolvedExpense;
use crate::charts::SeriesChart;
use crate::filters::FilterParams;
use crate::models::{Category, User, format_amount};
use crate::period::{SUMMARY_PERIODS, SummaryPeriod};
use crate::receipts::{Receipt, format_file_size};
use crate::recurring::RecurringExpense;
use crate::stats::{AnalyticsSummary, SummaryReport};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const NEW_CATEGORY_COLOR: &str = "#FF5733";

fn money(amount: Decimal) -> String {
    format!("${}", format_amount(amount))
}

fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(message) => format!(r#"<div class="status" data-type="error">{}</div>"#, escape(message)),
        None => String::new(),
    }
}

fn nav(user: Option<&User>) -> String {
    match user {
        Some(user) => format!(
            r#"<a href="/dashboard">Dashboard</a>
      <a href="/analytics">Analytics</a>
      <span class="who">{}</span>
      <form method="post" action="/logout"><button class="btn-ghost" type="submit">Logout</button></form>"#,
            escape(&user.email)
        ),
        None => r#"<a href="/login">Sign In</a>"#.to_string(),
    }
}

fn render_page(title: &str, user: Option<&User>, body: &str) -> String {
    LAYOUT_HTML
        .replace("{{TITLE}}", &escape(title))
        .replace("{{NAV}}", &nav(user))
        .replace("{{BODY}}", body)
}

pub fn render_home(user: Option<&User>) -> String {
    let cta = match user {
        Some(user) => {
            let first_name = user.full_name.split_whitespace().next().unwrap_or("");
            format!(
                r#"<a class="btn-add" href="/dashboard">Go to Dashboard</a>
      <p class="hint">Welcome back, {}!</p>"#,
                escape(first_name)
            )
        }
        None => r#"<a class="btn-add" href="/login#register">Start Tracking for Free</a>
      <a class="btn-sub" href="/login">Sign In</a>
      <p class="hint">No credit card required. Always free.</p>"#
            .to_string(),
    };
    let body = format!(
        r#"<header>
    <h1>ExpenseTracker Pro</h1>
    <p class="subtitle">Monitor spending, categorize expenses, set budgets and export reports.</p>
  </header>
  <section class="actions">
    {cta}
  </section>"#
    );
    render_page("ExpenseTracker Pro", user, &body)
}

pub fn render_login(error: Option<&str>) -> String {
    let body = format!(
        r#"<header>
    <h1>Sign In</h1>
    <p class="subtitle">Use your account to track expenses.</p>
  </header>
  {error}
  <section class="panel">
    <form class="card" method="post" action="/login">
      <h2>Login</h2>
      <label>Email <input type="email" name="email" required /></label>
      <label>Password <input type="password" name="password" required /></label>
      <button class="btn-add" type="submit">Sign In</button>
    </form>
    <form class="card" id="register" method="post" action="/register">
      <h2>Create account</h2>
      <label>Full name <input type="text" name="full_name" /></label>
      <label>Email <input type="email" name="email" required /></label>
      <label>Password <input type="password" name="password" required /></label>
      <label>Confirm password <input type="password" name="confirm_password" /></label>
      <button class="btn-sub" type="submit">Register</button>
    </form>
  </section>"#,
        error = error_banner(error)
    );
    render_page("Sign In", None, &body)
}

pub struct DashboardPage<'a> {
    pub user: Option<&'a User>,
    pub expenses: &'a [ResolvedExpense<'a>],
    pub categories: &'a [Category],
    pub total: Decimal,
    pub error: Option<&'a str>,
}

fn category_options(categories: &[Category], selected: Option<&str>) -> String {
    categories
        .iter()
        .map(|c| {
            let mark = if selected == Some(c.id.as_str()) { " selected" } else { "" };
            format!(
                r#"<option value="{}"{mark}>{}</option>"#,
                escape(&c.id),
                escape(&c.name)
            )
        })
        .collect()
}

fn category_chip(name: &str, color: &str) -> String {
    format!(
        r#"<span class="chip" style="border-color:{color}"><span class="dot" style="background:{color}"></span>{}</span>"#,
        escape(name),
        color = escape(color)
    )
}

fn expense_rows(expenses: &[ResolvedExpense<'_>], with_delete: bool) -> String {
    let mut rows = String::new();
    for resolved in expenses {
        let expense = resolved.expense;
        let action = if with_delete {
            format!(
                r#"<td><form method="post" action="/dashboard/expenses/{}/delete"><button class="btn-danger" type="submit">Delete</button></form></td>"#,
                escape(&expense.id)
            )
        } else {
            String::new()
        };
        rows.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td class="num">{} {}</td>{action}</tr>"#,
            expense.date.format("%Y-%m-%d"),
            escape(&expense.description),
            category_chip(resolved.category.name(), resolved.category.color()),
            escape(&expense.currency),
            format_amount(expense.amount),
        ));
    }
    rows
}

pub fn render_dashboard(page: &DashboardPage<'_>) -> String {
    let greeting = page
        .user
        .map(|u| if u.full_name.is_empty() { u.email.as_str() } else { u.full_name.as_str() })
        .unwrap_or("");

    let categories = if page.categories.is_empty() {
        "<p class=\"hint\">No categories yet. Add your first category above!</p>".to_string()
    } else {
        page.categories
            .iter()
            .map(|c| category_chip(&c.name, &c.color))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let expenses = if page.expenses.is_empty() {
        "<p class=\"hint\">No expenses yet. Add your first expense above!</p>".to_string()
    } else {
        format!(
            r#"<table>
      <thead><tr><th>Date</th><th>Description</th><th>Category</th><th class="num">Amount</th><th></th></tr></thead>
      <tbody>{}</tbody>
    </table>"#,
            expense_rows(page.expenses, true)
        )
    };

    let body = format!(
        r#"<header>
    <h1>Welcome back, {greeting}</h1>
    <p class="subtitle">Track your expenses and manage your budget.</p>
  </header>
  {error}
  <section class="panel">
    <div class="stat"><span class="label">Total Expenses</span><span class="value" id="total">{total}</span></div>
    <div class="stat"><span class="label">Total Transactions</span><span class="value">{count}</span></div>
    <div class="stat"><span class="label">Categories</span><span class="value">{category_count}</span></div>
  </section>
  <section class="panel">
    <form class="card" method="post" action="/dashboard/expenses">
      <h2>Add New Expense</h2>
      <label>Amount <input type="number" step="0.01" min="0" name="amount" placeholder="0.00" required /></label>
      <label>Currency
        <select name="currency"><option>USD</option><option>EUR</option><option>GBP</option><option>CAD</option></select>
      </label>
      <label>Category
        <select name="category_id" required><option value="">Select Category</option>{options}</select>
      </label>
      <label>Date <input type="datetime-local" name="date" /></label>
      <label>Description <input type="text" name="description" placeholder="Enter description" required /></label>
      <button class="btn-add" type="submit">Add Expense</button>
    </form>
    <form class="card" method="post" action="/dashboard/categories">
      <h2>Add New Category</h2>
      <label>Category Name <input type="text" name="name" placeholder="Enter category name" required /></label>
      <label>Color <input type="color" name="color" value="{default_color}" /></label>
      <button class="btn-sub" type="submit">Add</button>
    </form>
  </section>
  <section class="card">
    <h2>Categories ({category_count})</h2>
    <div class="chips">{categories}</div>
  </section>
  <section class="card">
    <h2>Recent Expenses ({count})</h2>
    {expenses}
  </section>"#,
        greeting = escape(greeting),
        error = error_banner(page.error),
        total = money(page.total),
        count = page.expenses.len(),
        category_count = page.categories.len(),
        options = category_options(page.categories, None),
        default_color = NEW_CATEGORY_COLOR,
    );
    render_page("Dashboard", page.user, &body)
}

pub struct AnalyticsPage<'a> {
    pub user: Option<&'a User>,
    pub now: DateTime<Utc>,
    pub summary: &'a AnalyticsSummary,
    pub report: &'a SummaryReport<'a>,
    pub period: SummaryPeriod,
    pub params: &'a FilterParams,
    pub active_filters: &'a [String],
    pub filtered: &'a [ResolvedExpense<'a>],
    pub filtered_total: Decimal,
    pub categories: &'a [Category],
    pub budgets: &'a [BudgetView],
    pub alerts: &'a [BudgetAlert],
    pub recurring: &'a [RecurringExpense],
    pub receipts: &'a [Receipt],
    pub monthly_trend: &'a SeriesChart,
    pub error: Option<&'a str>,
}

fn summary_cards(summary: &AnalyticsSummary) -> String {
    format!(
        r#"<section class="panel">
    <div class="stat"><span class="label">This Month</span><span class="value">{}</span><span class="hint">{} transactions</span></div>
    <div class="stat"><span class="label">This Year</span><span class="value">{}</span><span class="hint">{} transactions</span></div>
    <div class="stat"><span class="label">All Time</span><span class="value">{}</span><span class="hint">{} transactions</span></div>
    <div class="stat"><span class="label">Daily Average</span><span class="value">{}</span><span class="hint">this month</span></div>
    <div class="stat"><span class="label">Top Category</span><span class="value">{}</span><span class="hint">{}</span></div>
  </section>"#,
        money(summary.total_this_month),
        summary.transactions_this_month,
        money(summary.total_this_year),
        summary.transactions_this_year,
        money(summary.total_all_time),
        summary.total_transactions,
        money(summary.avg_daily_spending),
        escape(&summary.top_category.name),
        money(summary.top_category.amount),
    )
}

fn filter_form(page: &AnalyticsPage<'_>) -> String {
    let value = |v: &Option<String>| escape(v.as_deref().unwrap_or(""));
    let selected_range = page.params.date_range.as_deref().unwrap_or("all");
    let ranges = [
        ("all", "All Time"),
        ("today", "Today"),
        ("thisWeek", "This Week"),
        ("thisMonth", "This Month"),
        ("thisYear", "This Year"),
        ("custom", "Custom Range"),
    ]
    .iter()
    .map(|(key, label)| {
        let mark = if *key == selected_range { " selected" } else { "" };
        format!(r#"<option value="{key}"{mark}>{label}</option>"#)
    })
    .collect::<String>();

    let active = if page.active_filters.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p class="hint">Active filters: {}</p>"#,
            page.active_filters
                .iter()
                .map(|f| escape(f))
                .collect::<Vec<_>>()
                .join(" &middot; ")
        )
    };

    format!(
        r#"<section class="card">
    <h2>Filter Expenses</h2>
    <form class="filters" method="get" action="/analytics">
      <input type="hidden" name="period" value="{period}" />
      <label>Search <input type="text" name="search" value="{search}" /></label>
      <label>Category <select name="categoryId"><option value="">All Categories</option>{options}</select></label>
      <label>Date Range <select name="dateRange">{ranges}</select></label>
      <label>From <input type="date" name="customStartDate" value="{start}" /></label>
      <label>To <input type="date" name="customEndDate" value="{end}" /></label>
      <label>Min <input type="number" step="0.01" name="minAmount" value="{min}" /></label>
      <label>Max <input type="number" step="0.01" name="maxAmount" value="{max}" /></label>
      <button class="btn-sub" type="submit">Apply</button>
      <a href="/analytics">Clear</a>
    </form>
    {active}
    <p>Showing {count} expenses totalling <strong id="filtered-total">{total}</strong></p>
    <table>
      <thead><tr><th>Date</th><th>Description</th><th>Category</th><th class="num">Amount</th></tr></thead>
      <tbody>{rows}</tbody>
    </table>
  </section>"#,
        period = page.period.as_str(),
        search = value(&page.params.search),
        options = category_options(page.categories, page.params.category_id.as_deref()),
        start = value(&page.params.custom_start_date),
        end = value(&page.params.custom_end_date),
        min = value(&page.params.min_amount),
        max = value(&page.params.max_amount),
        count = page.filtered.len(),
        total = money(page.filtered_total),
        rows = expense_rows(page.filtered, false),
    )
}

fn export_form(params: &FilterParams) -> String {
    let hidden = |name: &str, v: &Option<String>| match v.as_deref() {
        Some(v) if !v.is_empty() => {
            format!(r#"<input type="hidden" name="{name}" value="{}" />"#, escape(v))
        }
        _ => String::new(),
    };
    format!(
        r#"<section class="card">
    <h2>Export</h2>
    <form method="get" action="/api/export">
      {}{}{}{}{}{}{}
      <label>Format <select name="format"><option value="csv">CSV</option><option value="pdf">PDF</option><option value="json">JSON</option></select></label>
      <label>Scope <select name="scope"><option value="filtered">Filtered expenses</option><option value="all">All expenses</option></select></label>
      <button class="btn-add" type="submit">Download</button>
    </form>
  </section>"#,
        hidden("search", &params.search),
        hidden("categoryId", &params.category_id),
        hidden("dateRange", &params.date_range),
        hidden("customStartDate", &params.custom_start_date),
        hidden("customEndDate", &params.custom_end_date),
        hidden("minAmount", &params.min_amount),
        hidden("maxAmount", &params.max_amount),
    )
}

fn summary_section(page: &AnalyticsPage<'_>) -> String {
    let report = page.report;
    let periods = SUMMARY_PERIODS
        .iter()
        .map(|p| {
            let mark = if *p == page.period { " selected" } else { "" };
            format!(r#"<option value="{}"{mark}>{}</option>"#, p.as_str(), p.as_str())
        })
        .collect::<String>();

    let comparison = match &report.comparison {
        Some(cmp) => {
            let verdict = if report.current.total > cmp.previous.total {
                format!(
                    "You spent {} more than {}",
                    money(report.current.total - cmp.previous.total),
                    escape(&cmp.previous.label)
                )
            } else {
                format!(
                    "You saved {} compared to {}",
                    money(cmp.previous.total - report.current.total),
                    escape(&cmp.previous.label)
                )
            };
            format!(
                r#"<p>{}: {} ({:+.1}%), {} transactions ({:+.1}%). {verdict}.</p>"#,
                escape(&cmp.previous.label),
                money(cmp.previous.total),
                cmp.total_change,
                cmp.previous.count,
                cmp.count_change,
            )
        }
        None => String::new(),
    };

    let breakdown = report
        .category_breakdown
        .iter()
        .map(|c| {
            format!(
                r#"<tr><td>{}</td><td class="num">{}</td><td class="num">{}</td><td class="num">{:.1}%</td></tr>"#,
                category_chip(&c.name, &c.color),
                money(c.amount),
                c.count,
                c.percentage
            )
        })
        .collect::<String>();

    let top = report
        .top_expenses
        .iter()
        .map(|e| {
            format!(
                "<li>{} &middot; {} &middot; {}</li>",
                escape(&e.expense.description),
                escape(e.category_name),
                money(e.expense.amount)
            )
        })
        .collect::<String>();

    format!(
        r#"<section class="card">
    <h2>Summary: {label}</h2>
    <form class="filters" method="get" action="/analytics">
      <label>Period <select name="period">{periods}</select></label>
      <button class="btn-sub" type="submit">Show</button>
    </form>
    <p>Total {total} across {count} transactions. Daily average {daily}, per transaction {per}.</p>
    {comparison}
    <table>
      <thead><tr><th>Category</th><th class="num">Amount</th><th class="num">Count</th><th class="num">Share</th></tr></thead>
      <tbody>{breakdown}</tbody>
    </table>
    <h3>Top Expenses</h3>
    <ol>{top}</ol>
  </section>"#,
        label = escape(&report.current.label),
        total = money(report.current.total),
        count = report.current.count,
        daily = money(report.averages.daily),
        per = money(report.averages.per_transaction),
    )
}

fn budget_section(page: &AnalyticsPage<'_>) -> String {
    let alerts = page
        .alerts
        .iter()
        .map(|a| format!(r#"<li class="alert-{:?}">{}</li>"#, a.status, escape(&a.message())))
        .collect::<String>();
    let rows = page
        .budgets
        .iter()
        .map(|b| {
            format!(
                r#"<div class="budget">
      <div class="budget-head">{chip} <span>{spent} of {amount} ({period})</span>
        <form method="post" action="/analytics/budgets/{id}/delete"><button class="btn-ghost" type="submit">Remove</button></form>
      </div>
      <div class="bar"><div style="width:{width:.1}%;background:{color}"></div></div>
      <span class="hint">{pct:.1}% used, {remaining} remaining</span>
    </div>"#,
                chip = category_chip(&b.category_name, &b.category_color),
                spent = money(b.progress.spent),
                amount = money(b.budget.amount),
                period = b.budget.period.as_str(),
                id = escape(&b.budget.id),
                width = b.progress.bar_width,
                color = b.progress.status.color(),
                pct = b.progress.percentage,
                remaining = money(b.progress.remaining),
            )
        })
        .collect::<String>();

    format!(
        r#"<section class="card">
    <h2>Budgets</h2>
    <ul class="alerts">{alerts}</ul>
    {rows}
    <form class="filters" method="post" action="/analytics/budgets">
      <label>Category <select name="category_id" required><option value="">Select Category</option>{options}</select></label>
      <label>Amount <input type="number" step="0.01" min="0.01" name="amount" required /></label>
      <label>Period <select name="period"><option value="monthly">Monthly</option><option value="yearly">Yearly</option></select></label>
      <label>Alert at % <input type="number" min="1" max="100" name="alert_threshold" value="80" /></label>
      <button class="btn-add" type="submit">Add Budget</button>
    </form>
  </section>"#,
        options = category_options(page.categories, None),
    )
}

fn recurring_section(page: &AnalyticsPage<'_>) -> String {
    let rows = page
        .recurring
        .iter()
        .map(|r| {
            let due = if r.is_due(page.now) {
                format!(
                    r#"<form method="post" action="/analytics/recurring/{}/process"><button class="btn-add" type="submit">Process</button></form>"#,
                    escape(&r.id)
                )
            } else {
                String::new()
            };
            format!(
                r#"<tr><td>{name}</td><td class="num">{amount}</td><td>{freq}</td><td>{next}</td><td>{state}</td>
        <td class="row-actions">{due}
          <form method="post" action="/analytics/recurring/{id}/toggle"><button class="btn-ghost" type="submit">{toggle}</button></form>
          <form method="post" action="/analytics/recurring/{id}/delete"><button class="btn-danger" type="submit">Delete</button></form>
        </td></tr>"#,
                name = escape(&r.name),
                amount = money(r.amount),
                freq = r.frequency.label(),
                next = r.next_due.format("%Y-%m-%d"),
                state = if r.is_active { "Active" } else { "Paused" },
                id = escape(&r.id),
                toggle = if r.is_active { "Pause" } else { "Resume" },
            )
        })
        .collect::<String>();

    let due_count = page.recurring.iter().filter(|r| r.is_due(page.now)).count();
    format!(
        r#"<section class="card">
    <h2>Recurring Expenses</h2>
    <p class="hint">{due_count} due now</p>
    <table>
      <thead><tr><th>Name</th><th class="num">Amount</th><th>Frequency</th><th>Next Due</th><th>Status</th><th></th></tr></thead>
      <tbody>{rows}</tbody>
    </table>
    <form class="filters" method="post" action="/analytics/recurring">
      <label>Name <input type="text" name="name" required /></label>
      <label>Amount <input type="number" step="0.01" min="0.01" name="amount" required /></label>
      <label>Category <select name="category_id" required><option value="">Select Category</option>{options}</select></label>
      <label>Frequency <select name="frequency"><option value="daily">Daily</option><option value="weekly">Weekly</option><option value="monthly" selected>Monthly</option><option value="yearly">Yearly</option></select></label>
      <label>Start <input type="date" name="start_date" /></label>
      <label>End <input type="date" name="end_date" /></label>
      <label>Description <input type="text" name="description" /></label>
      <button class="btn-add" type="submit">Add Recurring</button>
    </form>
  </section>"#,
        options = category_options(page.categories, None),
    )
}

fn trend_section(trend: &SeriesChart) -> String {
    let peak = trend.data.iter().copied().fold(0.0_f64, f64::max);
    let bars = trend
        .labels
        .iter()
        .zip(&trend.data)
        .map(|(label, value)| {
            let width = if peak > 0.0 { value / peak * 100.0 } else { 0.0 };
            format!(
                r#"<div class="trend-row"><span>{}</span><div class="bar"><div style="width:{width:.1}%"></div></div><span class="num">${value:.2}</span></div>"#,
                escape(label)
            )
        })
        .collect::<String>();
    format!(
        r#"<section class="card">
    <h2>{}</h2>
    {bars}
  </section>"#,
        escape(&trend.label)
    )
}

fn receipt_section(receipts: &[Receipt]) -> String {
    if receipts.is_empty() {
        return String::new();
    }
    let rows = receipts
        .iter()
        .map(|r| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{} &middot; {} &middot; {}</td></tr>"#,
                escape(&r.name),
                format_file_size(r.size),
                escape(&r.extracted_data.merchant),
                money(r.extracted_data.amount),
                escape(&r.extracted_data.date),
            )
        })
        .collect::<String>();
    format!(
        r#"<section class="card">
    <h2>Receipts ({})</h2>
    <table>
      <thead><tr><th>File</th><th>Size</th><th>Extracted</th></tr></thead>
      <tbody>{rows}</tbody>
    </table>
  </section>"#,
        receipts.len()
    )
}

pub fn render_analytics(page: &AnalyticsPage<'_>) -> String {
    let body = [
        r#"<header>
    <h1>Analytics</h1>
    <p class="subtitle">Spending summaries, budgets and recurring expenses.</p>
  </header>"#
            .to_string(),
        error_banner(page.error),
        summary_cards(page.summary),
        summary_section(page),
        budget_section(page),
        recurring_section(page),
        filter_form(page),
        trend_section(page.monthly_trend),
        export_form(page.params),
        receipt_section(page.receipts),
    ]
    .join("\n  ");
    render_page("Analytics", page.user, &body)
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} | ExpenseTracker Pro</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      justify-items: center;
      padding: 24px 18px 48px;
    }

    nav {
      width: min(1080px, 100%);
      display: flex;
      align-items: center;
      gap: 18px;
      margin-bottom: 18px;
    }

    nav .brand {
      font-family: "Fraunces", "Georgia", serif;
      font-size: 1.3rem;
      margin-right: auto;
      color: var(--accent-2);
      text-decoration: none;
    }

    nav a {
      color: var(--accent-2);
      font-weight: 600;
    }

    nav form {
      margin: 0;
    }

    .app {
      width: min(1080px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
      animation: rise 600ms ease;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.3rem;
    }

    .subtitle,
    .hint {
      margin: 0;
      color: #6f6a65;
      font-size: 0.95rem;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    .stat,
    .card {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.6rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    label {
      display: grid;
      gap: 4px;
      font-size: 0.9rem;
      color: #5f5c57;
    }

    input,
    select {
      font: inherit;
      padding: 8px 10px;
      border-radius: 10px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    .filters {
      display: flex;
      flex-wrap: wrap;
      align-items: end;
      gap: 12px;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th,
    td {
      padding: 10px 8px;
      text-align: left;
      border-bottom: 1px solid #f0ebe4;
    }

    .num {
      text-align: right;
    }

    .chip {
      display: inline-flex;
      align-items: center;
      gap: 6px;
      padding: 4px 12px;
      border: 2px solid;
      border-radius: 999px;
      font-size: 0.9rem;
    }

    .dot {
      width: 10px;
      height: 10px;
      border-radius: 50%;
    }

    .bar {
      height: 10px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.08);
      overflow: hidden;
      flex: 1;
    }

    .bar div {
      height: 100%;
      background: var(--accent);
    }

    .budget-head,
    .trend-row,
    .row-actions {
      display: flex;
      align-items: center;
      gap: 12px;
    }

    .row-actions form {
      margin: 0;
    }

    a.btn-add,
    a.btn-sub,
    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      text-decoration: none;
      display: inline-flex;
      align-items: center;
      justify-content: center;
    }

    .btn-add {
      background: var(--accent);
      color: white;
    }

    .btn-sub {
      background: var(--accent-2);
      color: white;
    }

    .btn-ghost {
      background: transparent;
      color: var(--accent-2);
      padding: 6px 10px;
    }

    .btn-danger {
      background: #ef4444;
      color: white;
      padding: 6px 12px;
    }

    .status[data-type="error"] {
      color: #c63b2b;
      font-weight: 600;
    }

    .alerts .alert-Exceeded {
      color: #c63b2b;
    }

    .alerts .alert-Warning {
      color: #b7791f;
    }

    @keyframes rise {
      from {
        opacity: 0;
        transform: translateY(18px);
      }
      to {
        opacity: 1;
        transform: translateY(0);
      }
    }

    @media (max-width: 600px) {
      .app {
        padding: 28px 22px;
      }
    }
  </style>
</head>
<body>
  <nav>
    <a class="brand" href="/">ExpenseTracker Pro</a>
    {{NAV}}
  </nav>
  <main class="app">
  {{BODY}}
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_markup() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn login_page_shows_error() {
        let html = render_login(Some("Invalid <email>"));
        assert!(html.contains("Invalid &lt;email&gt;"));
        assert!(html.contains(r#"action="/register""#));
    }

    #[test]
    fn dashboard_renders_forms_and_rows() {
        use crate::categories::CategoryIndex;
        use crate::models::Expense;
        use chrono::TimeZone;

        let categories = vec![Category {
            id: "c1".into(),
            user_id: "u".into(),
            name: "Food".into(),
            color: "#10b981".into(),
            description: None,
            icon: None,
        }];
        let expenses = vec![Expense {
            id: "e1".into(),
            user_id: "u".into(),
            amount: Decimal::new(1250, 2),
            currency: "USD".into(),
            category_id: "c1".into(),
            description: "Lunch <special>".into(),
            date: Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap(),
            created_at: None,
            updated_at: None,
        }];
        let index = CategoryIndex::new(&categories);
        let resolved = index.resolve_all(&expenses);
        let html = render_dashboard(&DashboardPage {
            user: None,
            expenses: &resolved,
            categories: &categories,
            total: Decimal::new(1250, 2),
            error: Some("Category name is required"),
        });

        assert!(html.contains(r#"action="/dashboard/categories""#));
        assert!(html.contains(r##"name="color" value="#FF5733""##));
        assert!(html.contains(r#"action="/dashboard/expenses""#));
        assert!(html.contains("/dashboard/expenses/e1/delete"));
        assert!(html.contains("Lunch &lt;special&gt;"));
        assert!(html.contains("$12.50"));
        assert!(html.contains("Category name is required"));
    }

    #[test]
    fn home_greets_signed_in_user() {
        let user = User {
            id: "u".into(),
            email: "ada@example.com".into(),
            full_name: "Ada Lovelace".into(),
            roles: vec![],
        };
        let html = render_home(Some(&user));
        assert!(html.contains("Welcome back, Ada!"));
        assert!(html.contains("/logout"));
        assert!(render_home(None).contains("Sign In"));
    }
}

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{Assessment, SalaryInputs, SlabResolution, assess};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const FBR_PORTAL_URL: &str = "https://share.google/5QbLZn6MdDWtL43xT";
const DISCLAIMER: &str = "General Advice: Always consult the official FBR income tax \
ordinance and a qualified tax professional for your specific filing needs.";
const INVALID_INPUT_MSG: &str = "Please ensure all fields contain valid numbers.";

#[derive(Parser, Debug)]
#[command(
    name = "pktax",
    about = "Pakistani salaried income tax calculator (FBR slabs, 16 monthly salary components + employer PF)"
)]
struct Cli {
    #[arg(long, default_value_t = 0.0, help = "Basic salary per month in rupees")]
    basic_salary: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "House rent allowance (HRA) per month"
    )]
    house_rent_allowance: f64,
    #[arg(long, default_value_t = 0.0, help = "Conveyance allowance per month")]
    conveyance_allowance: f64,
    #[arg(long, default_value_t = 0.0, help = "Medical allowance per month")]
    medical_allowance: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Other general allowance per month"
    )]
    other_allowance: f64,
    #[arg(long, default_value_t = 0.0, help = "Utility allowance per month")]
    utility_allowance: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Special or technical allowance per month"
    )]
    special_allowance: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Performance or ad-hoc bonus, monthly average"
    )]
    performance_bonus: f64,
    #[arg(long, default_value_t = 0.0, help = "Overtime, monthly average")]
    overtime: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "TADA / daily allowance, monthly average"
    )]
    daily_allowance: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Housing or accommodation allowance per month"
    )]
    housing_allowance: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Education or children allowance per month"
    )]
    education_allowance: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Leave encashment, monthly average"
    )]
    leave_encashment: f64,
    #[arg(long, default_value_t = 0.0, help = "Food or meal allowance per month")]
    food_allowance: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Commission or incentive, monthly average"
    )]
    commission: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Miscellaneous bonus or receipt, monthly average"
    )]
    miscellaneous_bonus: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Employer's provident fund contribution per year"
    )]
    employer_pf_contribution: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    basic_salary: Option<f64>,
    house_rent_allowance: Option<f64>,
    conveyance_allowance: Option<f64>,
    medical_allowance: Option<f64>,
    other_allowance: Option<f64>,
    utility_allowance: Option<f64>,
    special_allowance: Option<f64>,
    performance_bonus: Option<f64>,
    overtime: Option<f64>,
    daily_allowance: Option<f64>,
    housing_allowance: Option<f64>,
    education_allowance: Option<f64>,
    leave_encashment: Option<f64>,
    food_allowance: Option<f64>,
    commission: Option<f64>,
    miscellaneous_bonus: Option<f64>,
    employer_pf_contribution: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    taxable_income: f64,
    gross_annual_salary: f64,
    annual_tax: f64,
    monthly_tax: f64,
    slab: SlabResolution,
    summary: String,
    steps: String,
    assistant: String,
    disclaimer: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<SalaryInputs, String> {
    for (name, value) in [
        ("--basic-salary", cli.basic_salary),
        ("--house-rent-allowance", cli.house_rent_allowance),
        ("--conveyance-allowance", cli.conveyance_allowance),
        ("--medical-allowance", cli.medical_allowance),
        ("--other-allowance", cli.other_allowance),
        ("--utility-allowance", cli.utility_allowance),
        ("--special-allowance", cli.special_allowance),
        ("--performance-bonus", cli.performance_bonus),
        ("--overtime", cli.overtime),
        ("--daily-allowance", cli.daily_allowance),
        ("--housing-allowance", cli.housing_allowance),
        ("--education-allowance", cli.education_allowance),
        ("--leave-encashment", cli.leave_encashment),
        ("--food-allowance", cli.food_allowance),
        ("--commission", cli.commission),
        ("--miscellaneous-bonus", cli.miscellaneous_bonus),
        ("--employer-pf-contribution", cli.employer_pf_contribution),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a valid number"));
        }
    }

    Ok(SalaryInputs {
        basic_salary: cli.basic_salary,
        house_rent_allowance: cli.house_rent_allowance,
        conveyance_allowance: cli.conveyance_allowance,
        medical_allowance: cli.medical_allowance,
        other_allowance: cli.other_allowance,
        utility_allowance: cli.utility_allowance,
        special_allowance: cli.special_allowance,
        performance_bonus: cli.performance_bonus,
        overtime: cli.overtime,
        daily_allowance: cli.daily_allowance,
        housing_allowance: cli.housing_allowance,
        education_allowance: cli.education_allowance,
        leave_encashment: cli.leave_encashment,
        food_allowance: cli.food_allowance,
        commission: cli.commission,
        miscellaneous_bonus: cli.miscellaneous_bonus,
        employer_pf_contribution: cli.employer_pf_contribution,
    })
}

/// Runs a one-shot calculation from CLI flags and prints the report to
/// stdout. `args` must start with the binary name, as `clap` expects.
pub fn run_calc(args: Vec<String>) -> Result<(), String> {
    let cli = Cli::parse_from(args);
    let inputs = build_inputs(cli)?;
    let assessment = assess(&inputs);
    println!("{}", render_report(&inputs, &assessment));
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Tax calculator listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => calculate_handler_impl(payload),
        Err(_) => error_response(StatusCode::BAD_REQUEST, INVALID_INPUT_MSG),
    }
}

async fn calculate_post_handler(
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => calculate_handler_impl(payload),
        Err(_) => error_response(StatusCode::BAD_REQUEST, INVALID_INPUT_MSG),
    }
}

fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let assessment = assess(&inputs);
    json_response(StatusCode::OK, build_calculate_response(&inputs, &assessment))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<SalaryInputs, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid calculate payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: CalculatePayload) -> Result<SalaryInputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.basic_salary {
        cli.basic_salary = v;
    }
    if let Some(v) = payload.house_rent_allowance {
        cli.house_rent_allowance = v;
    }
    if let Some(v) = payload.conveyance_allowance {
        cli.conveyance_allowance = v;
    }
    if let Some(v) = payload.medical_allowance {
        cli.medical_allowance = v;
    }
    if let Some(v) = payload.other_allowance {
        cli.other_allowance = v;
    }
    if let Some(v) = payload.utility_allowance {
        cli.utility_allowance = v;
    }
    if let Some(v) = payload.special_allowance {
        cli.special_allowance = v;
    }
    if let Some(v) = payload.performance_bonus {
        cli.performance_bonus = v;
    }
    if let Some(v) = payload.overtime {
        cli.overtime = v;
    }
    if let Some(v) = payload.daily_allowance {
        cli.daily_allowance = v;
    }
    if let Some(v) = payload.housing_allowance {
        cli.housing_allowance = v;
    }
    if let Some(v) = payload.education_allowance {
        cli.education_allowance = v;
    }
    if let Some(v) = payload.leave_encashment {
        cli.leave_encashment = v;
    }
    if let Some(v) = payload.food_allowance {
        cli.food_allowance = v;
    }
    if let Some(v) = payload.commission {
        cli.commission = v;
    }
    if let Some(v) = payload.miscellaneous_bonus {
        cli.miscellaneous_bonus = v;
    }
    if let Some(v) = payload.employer_pf_contribution {
        cli.employer_pf_contribution = v;
    }

    build_inputs(cli)
}

// Empty form fields arrive as missing keys, so every field defaults to zero
// the way the web form does.
fn default_cli_for_api() -> Cli {
    Cli {
        basic_salary: 0.0,
        house_rent_allowance: 0.0,
        conveyance_allowance: 0.0,
        medical_allowance: 0.0,
        other_allowance: 0.0,
        utility_allowance: 0.0,
        special_allowance: 0.0,
        performance_bonus: 0.0,
        overtime: 0.0,
        daily_allowance: 0.0,
        housing_allowance: 0.0,
        education_allowance: 0.0,
        leave_encashment: 0.0,
        food_allowance: 0.0,
        commission: 0.0,
        miscellaneous_bonus: 0.0,
        employer_pf_contribution: 0.0,
    }
}

fn build_calculate_response(inputs: &SalaryInputs, assessment: &Assessment) -> CalculateResponse {
    CalculateResponse {
        taxable_income: assessment.taxable_income,
        gross_annual_salary: assessment.taxable_income - inputs.employer_pf_contribution,
        annual_tax: assessment.annual_tax,
        monthly_tax: assessment.monthly_tax,
        slab: assessment.slab,
        summary: render_summary(assessment),
        steps: render_steps(inputs, assessment),
        assistant: render_assistant(assessment),
        disclaimer: DISCLAIMER.to_string(),
    }
}

/// Formats a rupee amount with comma thousands separators and two decimals.
fn format_rupees(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac:02}")
}

fn render_summary(assessment: &Assessment) -> String {
    format!(
        "### Calculated Tax Summary\n\n\
         | Metric | Value |\n\
         | :--- | :--- |\n\
         | Annual Taxable Income | Rs. {} |\n\
         | **Annual Tax** | **Rs. {}** |\n\
         | **Monthly Tax** | **Rs. {}** |\n",
        format_rupees(assessment.taxable_income),
        format_rupees(assessment.annual_tax),
        format_rupees(assessment.monthly_tax),
    )
}

fn render_steps(inputs: &SalaryInputs, assessment: &Assessment) -> String {
    let gross = assessment.taxable_income - inputs.employer_pf_contribution;
    let slab = &assessment.slab;

    let mut steps = String::from("### Step-by-Step Guide\n\n");
    steps.push_str("**STEP 1: Calculate Annual Taxable Income**\n");
    steps.push_str(&format!(
        "Gross Annual Salary (16 components x 12): Rs. {}\n",
        format_rupees(gross)
    ));
    steps.push_str(&format!(
        "Annual Taxable Income (Gross Salary + Employer PF): **Rs. {}**\n",
        format_rupees(assessment.taxable_income)
    ));

    steps.push_str("\n**STEP 2 & 3: Apply Tax Slab and Calculate Annual Tax**\n");
    steps.push_str(&format!("Applicable Slab: **{}**\n", slab.slab_label));

    if assessment.annual_tax == 0.0 && assessment.taxable_income <= 600_000.0 {
        steps.push_str("Annual Tax: 0% as income does not exceed Rs. 600,000.\n");
    } else if slab.fixed_tax == 0.0 {
        steps.push_str(&format!(
            "Annual Tax Calculation: 1% of (Rs. {} - Rs. 600,000) = **Rs. {}**\n",
            format_rupees(assessment.taxable_income),
            format_rupees(assessment.annual_tax)
        ));
    } else {
        let rate_percent = (slab.rate * 100.0).round() as u32;
        let marginal_tax = slab.excess * slab.rate;
        steps.push_str(&format!(
            "Annual Tax Calculation: Fixed Tax (Rs. {}) + {}% of excess (Rs. {} x {} = Rs. {})\n",
            format_rupees(slab.fixed_tax),
            rate_percent,
            format_rupees(slab.excess),
            slab.rate,
            format_rupees(marginal_tax)
        ));
        steps.push_str(&format!(
            "Total Annual Tax: **Rs. {}**\n",
            format_rupees(assessment.annual_tax)
        ));
    }

    steps.push_str("\n**STEP 4: Calculate Monthly Tax**\n");
    steps.push_str(&format!(
        "Monthly Tax: Rs. {} / 12 = **Rs. {}**\n",
        format_rupees(assessment.annual_tax),
        format_rupees(assessment.monthly_tax)
    ));

    steps
}

fn render_assistant(assessment: &Assessment) -> String {
    let mut assistant = String::from("## Tax Filing Assistant & Next Steps\n\n");

    if assessment.monthly_tax > 0.0 {
        assistant.push_str(&format!(
            "* **Verify TDS:** Check your payslips to ensure your employer deducts \
             **Rs. {}** (Tax Deducted at Source).\n",
            format_rupees(assessment.monthly_tax)
        ));
    } else {
        assistant.push_str(
            "* **No Tax Liability:** Your income falls below the minimum taxable \
             limit (Rs. 600,000).\n",
        );
    }

    if assessment.taxable_income >= 600_000.0 {
        assistant.push_str(
            "* **Mandatory Filing:** Since your income is above Rs. 600,000, you are \
             legally required to file an annual income tax return with the FBR.\n",
        );
    }

    assistant.push_str(&format!(
        "* **FBR Portal:** The filing is done electronically via the \
         **[FBR Iris Portal]({FBR_PORTAL_URL})**.\n"
    ));

    assistant
}

fn render_report(inputs: &SalaryInputs, assessment: &Assessment) -> String {
    format!(
        "{}\n{}\n{}\n{}\n",
        render_summary(assessment),
        render_steps(inputs, assessment),
        render_assistant(assessment),
        DISCLAIMER
    )
}

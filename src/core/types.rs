use serde::Serialize;

/// The 17 salary figures a calculation runs on: 16 monthly components plus
/// the employer's annual provident fund contribution. All amounts in rupees.
#[derive(Debug, Clone, Copy, Default)]
pub struct SalaryInputs {
    pub basic_salary: f64,
    pub house_rent_allowance: f64,
    pub conveyance_allowance: f64,
    pub medical_allowance: f64,
    pub other_allowance: f64,
    pub utility_allowance: f64,
    pub special_allowance: f64,
    pub performance_bonus: f64,
    pub overtime: f64,
    pub daily_allowance: f64,
    pub housing_allowance: f64,
    pub education_allowance: f64,
    pub leave_encashment: f64,
    pub food_allowance: f64,
    pub commission: f64,
    pub miscellaneous_bonus: f64,
    /// Annual figure, not annualized.
    pub employer_pf_contribution: f64,
}

/// One tier of the progressive slab table.
///
/// `ceiling` is `None` for the open-ended top tier. `threshold` is the income
/// above which `rate` applies; tiers are contiguous, so each tier's threshold
/// equals the previous tier's ceiling.
#[derive(Debug, Clone, Copy)]
pub struct TaxSlab {
    pub label: &'static str,
    pub ceiling: Option<f64>,
    pub fixed_tax: f64,
    pub rate: f64,
    pub threshold: f64,
}

/// The slab a taxable income landed in, with the raw components of the tax
/// calculation kept for the step-by-step explanation.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlabResolution {
    pub slab_label: &'static str,
    pub fixed_tax: f64,
    pub rate: f64,
    pub threshold: f64,
    pub excess: f64,
    pub annual_tax: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub taxable_income: f64,
    pub annual_tax: f64,
    pub monthly_tax: f64,
    pub slab: SlabResolution,
}

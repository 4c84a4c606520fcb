mod engine;
mod types;

pub use engine::{TAX_SLABS, annual_taxable_income, assess, gross_annual_salary, resolve_slab};
pub use types::{Assessment, SalaryInputs, SlabResolution, TaxSlab};

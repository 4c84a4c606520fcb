use super::{Assessment, SalaryInputs, SlabResolution, TaxSlab};

/// FBR progressive slab table for salaried individuals.
///
/// Array order is evaluation order: the first tier whose ceiling covers the
/// income wins, and the unbounded top tier catches everything else. A tier
/// ceiling is inclusive, so an income exactly on a boundary falls into the
/// lower tier.
pub const TAX_SLABS: [TaxSlab; 6] = [
    TaxSlab {
        label: "S#1 (Upto Rs. 600,000)",
        ceiling: Some(600_000.0),
        fixed_tax: 0.0,
        rate: 0.0,
        threshold: 0.0,
    },
    TaxSlab {
        label: "S#2 (Rs. 600,000 to Rs. 1,200,000)",
        ceiling: Some(1_200_000.0),
        fixed_tax: 0.0,
        rate: 0.01,
        threshold: 600_000.0,
    },
    TaxSlab {
        label: "S#3 (Rs. 1,200,000 to Rs. 2,200,000)",
        ceiling: Some(2_200_000.0),
        fixed_tax: 6_000.0,
        rate: 0.11,
        threshold: 1_200_000.0,
    },
    TaxSlab {
        label: "S#4 (Rs. 2,200,000 to Rs. 3,200,000)",
        ceiling: Some(3_200_000.0),
        fixed_tax: 116_000.0,
        rate: 0.23,
        threshold: 2_200_000.0,
    },
    TaxSlab {
        label: "S#5 (Rs. 3,200,000 to Rs. 4,100,000)",
        ceiling: Some(4_100_000.0),
        fixed_tax: 346_000.0,
        rate: 0.30,
        threshold: 3_200_000.0,
    },
    TaxSlab {
        label: "S#6 (Over Rs. 4,100,000)",
        ceiling: None,
        fixed_tax: 616_000.0,
        rate: 0.35,
        threshold: 4_100_000.0,
    },
];

fn monthly_component_total(inputs: &SalaryInputs) -> f64 {
    inputs.basic_salary
        + inputs.house_rent_allowance
        + inputs.conveyance_allowance
        + inputs.medical_allowance
        + inputs.other_allowance
        + inputs.utility_allowance
        + inputs.special_allowance
        + inputs.performance_bonus
        + inputs.overtime
        + inputs.daily_allowance
        + inputs.housing_allowance
        + inputs.education_allowance
        + inputs.leave_encashment
        + inputs.food_allowance
        + inputs.commission
        + inputs.miscellaneous_bonus
}

/// Sum of the 16 monthly components, annualized.
pub fn gross_annual_salary(inputs: &SalaryInputs) -> f64 {
    monthly_component_total(inputs) * 12.0
}

/// Annual taxable income: gross annual salary plus the employer's annual
/// provident fund contribution.
pub fn annual_taxable_income(inputs: &SalaryInputs) -> f64 {
    gross_annual_salary(inputs) + inputs.employer_pf_contribution
}

/// Finds the slab covering `taxable_income` and computes the annual tax.
///
/// Total over all finite inputs. Negative income falls into the zero-tax
/// first tier; the business rules leave that case undefined and this keeps
/// the historical behavior.
pub fn resolve_slab(taxable_income: f64) -> SlabResolution {
    for slab in &TAX_SLABS {
        if let Some(ceiling) = slab.ceiling {
            if taxable_income <= ceiling {
                return resolution_for(slab, taxable_income);
            }
        }
    }
    resolution_for(&TAX_SLABS[TAX_SLABS.len() - 1], taxable_income)
}

fn resolution_for(slab: &TaxSlab, taxable_income: f64) -> SlabResolution {
    let excess = taxable_income - slab.threshold;
    let annual_tax = if slab.rate == 0.0 {
        0.0
    } else {
        slab.fixed_tax + excess * slab.rate
    };
    SlabResolution {
        slab_label: slab.label,
        fixed_tax: slab.fixed_tax,
        rate: slab.rate,
        threshold: slab.threshold,
        excess,
        annual_tax,
    }
}

/// Runs the full calculation: aggregation, slab resolution, and the monthly
/// tax derivation.
pub fn assess(inputs: &SalaryInputs) -> Assessment {
    let taxable_income = annual_taxable_income(inputs);
    let slab = resolve_slab(taxable_income);
    Assessment {
        taxable_income,
        annual_tax: slab.annual_tax,
        monthly_tax: slab.annual_tax / 12.0,
        slab,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> SalaryInputs {
        SalaryInputs::default()
    }

    fn uniform_monthly_inputs(per_component: f64, employer_pf: f64) -> SalaryInputs {
        SalaryInputs {
            basic_salary: per_component,
            house_rent_allowance: per_component,
            conveyance_allowance: per_component,
            medical_allowance: per_component,
            other_allowance: per_component,
            utility_allowance: per_component,
            special_allowance: per_component,
            performance_bonus: per_component,
            overtime: per_component,
            daily_allowance: per_component,
            housing_allowance: per_component,
            education_allowance: per_component,
            leave_encashment: per_component,
            food_allowance: per_component,
            commission: per_component,
            miscellaneous_bonus: per_component,
            employer_pf_contribution: employer_pf,
        }
    }

    #[test]
    fn slab_table_tiers_are_contiguous_and_increasing() {
        for pair in TAX_SLABS.windows(2) {
            let lower_ceiling = pair[0].ceiling.expect("only the last tier is unbounded");
            assert_approx(pair[1].threshold, lower_ceiling);
            if let Some(upper_ceiling) = pair[1].ceiling {
                assert!(upper_ceiling > lower_ceiling);
            }
        }
        assert!(TAX_SLABS[TAX_SLABS.len() - 1].ceiling.is_none());
    }

    #[test]
    fn aggregator_sums_sixteen_components_times_twelve_plus_pf() {
        let inputs = uniform_monthly_inputs(50_000.0, 100_000.0);
        assert_approx(gross_annual_salary(&inputs), 9_600_000.0);
        assert_approx(annual_taxable_income(&inputs), 9_700_000.0);
    }

    #[test]
    fn aggregator_counts_every_component_once() {
        let mut inputs = sample_inputs();
        inputs.basic_salary = 1.0;
        inputs.house_rent_allowance = 2.0;
        inputs.conveyance_allowance = 4.0;
        inputs.medical_allowance = 8.0;
        inputs.other_allowance = 16.0;
        inputs.utility_allowance = 32.0;
        inputs.special_allowance = 64.0;
        inputs.performance_bonus = 128.0;
        inputs.overtime = 256.0;
        inputs.daily_allowance = 512.0;
        inputs.housing_allowance = 1_024.0;
        inputs.education_allowance = 2_048.0;
        inputs.leave_encashment = 4_096.0;
        inputs.food_allowance = 8_192.0;
        inputs.commission = 16_384.0;
        inputs.miscellaneous_bonus = 32_768.0;
        inputs.employer_pf_contribution = 7.0;
        assert_approx(annual_taxable_income(&inputs), 65_535.0 * 12.0 + 7.0);
    }

    #[test]
    fn income_up_to_six_hundred_thousand_is_tax_free() {
        assert_approx(resolve_slab(0.0).annual_tax, 0.0);
        assert_approx(resolve_slab(350_000.0).annual_tax, 0.0);
        assert_approx(resolve_slab(600_000.0).annual_tax, 0.0);
    }

    #[test]
    fn second_slab_taxes_one_percent_of_excess() {
        let resolution = resolve_slab(900_000.0);
        assert_eq!(resolution.slab_label, "S#2 (Rs. 600,000 to Rs. 1,200,000)");
        assert_approx(resolution.excess, 300_000.0);
        assert_approx(resolution.annual_tax, 3_000.0);
    }

    #[test]
    fn boundary_income_falls_into_lower_slab() {
        let at_first_ceiling = resolve_slab(600_000.0);
        assert_eq!(at_first_ceiling.slab_label, "S#1 (Upto Rs. 600,000)");

        let at_second_ceiling = resolve_slab(1_200_000.0);
        assert_eq!(
            at_second_ceiling.slab_label,
            "S#2 (Rs. 600,000 to Rs. 1,200,000)"
        );
        assert_approx(at_second_ceiling.annual_tax, 6_000.0);
    }

    #[test]
    fn third_slab_ceiling_matches_fourth_slab_fixed_tax() {
        let resolution = resolve_slab(2_200_000.0);
        assert_eq!(resolution.slab_label, "S#3 (Rs. 1,200,000 to Rs. 2,200,000)");
        assert_approx(resolution.annual_tax, 116_000.0);
    }

    #[test]
    fn middle_slabs_apply_fixed_tax_plus_marginal_rate() {
        let resolution = resolve_slab(2_700_000.0);
        assert_eq!(resolution.slab_label, "S#4 (Rs. 2,200,000 to Rs. 3,200,000)");
        assert_approx(resolution.fixed_tax, 116_000.0);
        assert_approx(resolution.excess, 500_000.0);
        assert_approx(resolution.annual_tax, 116_000.0 + 0.23 * 500_000.0);
    }

    #[test]
    fn top_slab_catches_income_over_four_point_one_million() {
        let resolution = resolve_slab(5_000_000.0);
        assert_eq!(resolution.slab_label, "S#6 (Over Rs. 4,100,000)");
        assert_approx(resolution.excess, 900_000.0);
        assert_approx(resolution.annual_tax, 931_000.0);
    }

    #[test]
    fn tax_is_continuous_at_every_slab_boundary() {
        for pair in TAX_SLABS.windows(2) {
            let ceiling = pair[0].ceiling.expect("only the last tier is unbounded");
            assert_approx(resolve_slab(ceiling).annual_tax, pair[1].fixed_tax);
        }
    }

    #[test]
    fn negative_income_resolves_to_zero_tax() {
        let resolution = resolve_slab(-250_000.0);
        assert_eq!(resolution.slab_label, "S#1 (Upto Rs. 600,000)");
        assert_approx(resolution.annual_tax, 0.0);
    }

    #[test]
    fn assess_divides_annual_tax_by_twelve() {
        let inputs = uniform_monthly_inputs(50_000.0, 100_000.0);
        let assessment = assess(&inputs);
        assert_approx(assessment.taxable_income, 9_700_000.0);
        assert_approx(assessment.annual_tax, 616_000.0 + 0.35 * 5_600_000.0);
        assert_approx(assessment.monthly_tax, assessment.annual_tax / 12.0);
    }

    #[test]
    fn assess_with_all_zero_inputs_owes_nothing() {
        let assessment = assess(&sample_inputs());
        assert_approx(assessment.taxable_income, 0.0);
        assert_approx(assessment.annual_tax, 0.0);
        assert_approx(assessment.monthly_tax, 0.0);
    }

    proptest! {
        #[test]
        fn prop_tax_is_finite_and_non_negative(income in 0.0f64..30_000_000.0) {
            let resolution = resolve_slab(income);
            prop_assert!(resolution.annual_tax.is_finite());
            prop_assert!(resolution.annual_tax >= 0.0);
            prop_assert!(resolution.annual_tax <= income);
        }

        #[test]
        fn prop_tax_is_monotone_in_income(
            lower in 0.0f64..30_000_000.0,
            bump in 0.0f64..10_000_000.0,
        ) {
            let low = resolve_slab(lower).annual_tax;
            let high = resolve_slab(lower + bump).annual_tax;
            prop_assert!(high + EPS >= low);
        }

        #[test]
        fn prop_monthly_tax_is_annual_tax_over_twelve(
            per_component in 0.0f64..500_000.0,
            employer_pf in 0.0f64..2_000_000.0,
        ) {
            let assessment = assess(&uniform_monthly_inputs(per_component, employer_pf));
            prop_assert!(assessment.monthly_tax == assessment.annual_tax / 12.0);
        }

        #[test]
        fn prop_resolved_slab_covers_the_income(income in 0.0f64..30_000_000.0) {
            let resolution = resolve_slab(income);
            prop_assert!(income >= resolution.threshold || resolution.threshold == 0.0);
            prop_assert!((income - resolution.threshold - resolution.excess).abs() <= EPS);
        }
    }
}

/// Cross-Validation Example
///
/// This example demonstrates:
/// - Building an example set with a nominal label
/// - Replacing missing values with attribute averages
/// - Filtering rows with a registered condition
/// - Stratified 5-fold splitting and iterating the folds

use exampleset::{
    Attribute, ConditionRegistry, ConditionedExampleSet, ExampleSet, ExampleSetBuilder,
    ReplaceMissingExampleSet, SamplingConfig, SamplingType, ScanMonitor, SplittedExampleSet, Value,
};

fn main() -> exampleset::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    println!("=== ExampleSet Cross-Validation Example ===\n");

    // 1. Build a small labelled data set
    println!("1. Building example set...");
    let mut builder = ExampleSetBuilder::new()
        .regular(Attribute::numeric("age"))
        .regular(Attribute::numeric("income"))
        .label(Attribute::nominal("churn"));
    for i in 0..50 {
        let age = if i % 11 == 0 { Value::Missing } else { Value::Numeric(20.0 + (i % 40) as f64) };
        let income = Value::Numeric(1000.0 + 37.0 * i as f64);
        let churn = Value::from(if i % 3 == 0 { "yes" } else { "no" });
        builder = builder.row(vec![age, income, churn]);
    }
    let set = builder.build()?;
    println!("   {} rows, {} attributes\n", set.size(), set.attributes().all_count());

    // 2. Replace missing ages with the average
    println!("2. Replacing missing values...");
    let complete = ReplaceMissingExampleSet::new(&set, &mut ScanMonitor::new())?;
    for (name, value) in complete.replacements() {
        println!("   {name}: {value:.2}");
    }
    println!();

    // 3. Keep customers older than 25
    println!("3. Filtering with a condition...");
    let registry = ConditionRegistry::with_builtin();
    let adults = ConditionedExampleSet::from_registry(
        &complete,
        &registry,
        "expression",
        "age > 25",
        false,
        &mut ScanMonitor::new(),
    )?;
    println!("   {} of {} rows kept\n", adults.size(), complete.size());

    // 4. Stratified folds
    println!("4. Stratified 5-fold split...");
    let config = SamplingConfig::seeded(SamplingType::Stratified, 42);
    let mut folds = SplittedExampleSet::split(&adults, &[0.2; 5], &config, &mut ScanMonitor::new())?;
    let label = adults
        .attributes()
        .label()
        .cloned()
        .ok_or_else(|| exampleset::Error::invalid_argument("missing label"))?;
    for fold in 0..folds.number_of_subsets() {
        folds.select_single_subset(fold)?;
        let churners = folds
            .examples()
            .filter(|e| e.value_as_string(&label) == "yes")
            .count();
        folds.select_all_subsets_but(fold)?;
        println!(
            "   fold {fold}: test {} rows ({churners} churners), train {} rows",
            adults.size() - folds.size(),
            folds.size()
        );
    }

    println!("\n=== Example Complete ===");
    Ok(())
}

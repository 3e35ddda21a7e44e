use chrono::{Duration, NaiveDate};
use forecast_pangan::data::Observation;
use forecast_pangan::{
    CommodityConfig, FeatureSchema, IterativeForecaster, MinMaxScaler, ModelInput, Result,
    SequenceAssembler, SequencePredictor,
};

/// Stand-in for a trained model: predicts tomorrow's scaled price as the
/// newest window row's lag-1 feature (naive persistence). A real deployment
/// wraps its serving backend in the same trait.
#[derive(Debug)]
struct PersistencePredictor {
    lag_indices: Vec<usize>,
}

impl SequencePredictor for PersistencePredictor {
    fn predict(&self, input: &ModelInput) -> Result<Vec<f64>> {
        let last_row = input.row(input.seq_len() - 1);
        Ok(self.lag_indices.iter().map(|&i| last_row[i]).collect())
    }

    fn target_count(&self) -> usize {
        self.lag_indices.len()
    }

    fn name(&self) -> &str {
        "naive persistence"
    }
}

fn main() -> Result<()> {
    env_logger::init();

    println!("Forecast Pangan: Basic Forecasting Example");
    println!("==========================================\n");

    let config = CommodityConfig::bundled();
    let group = config
        .group("Telur Ayam")
        .expect("bundled config has an egg group");

    // Synthesize three months of slightly drifting daily reports; a real
    // caller gets these from the upstream price report instead
    println!("Building sample observations for '{}'...", group.name);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let observations: Vec<Observation> = (0..90)
        .flat_map(|offset| {
            group.targets.iter().map(move |target| Observation {
                date: start + Duration::days(offset),
                series: target.clone(),
                price: 28_000.0 + offset as f64 * 25.0,
            })
        })
        .collect();

    // Assemble the model's input sequence
    let sequence = SequenceAssembler::assemble(&observations, &group.targets)?;
    let schema = FeatureSchema::of(&sequence);
    schema.validate(&sequence)?;
    println!(
        "Assembled a {}-row sequence ending {} with {} feature columns\n",
        sequence.len(),
        sequence.last_date(),
        sequence.feature_columns().len()
    );

    // Identity scalers and a persistence stub in place of trained artifacts
    let lag_indices: Vec<usize> = group
        .targets
        .iter()
        .map(|target| {
            let column = format!("{}_lag_1", target);
            schema
                .features()
                .iter()
                .position(|c| *c == column)
                .expect("lag_1 column exists for every target")
        })
        .collect();
    let predictor = PersistencePredictor { lag_indices };
    let scaler_x = MinMaxScaler::new(
        vec![0.0; schema.features().len()],
        vec![1.0; schema.features().len()],
    )?;
    let scaler_y = MinMaxScaler::new(vec![0.0; group.targets.len()], vec![1.0; group.targets.len()])?;

    // Roll the forecast forward two weeks
    println!("Forecasting 14 days...");
    let forecaster = IterativeForecaster::new(&predictor, &scaler_x, &scaler_y);
    let forecast = forecaster.forecast(&sequence, 14)?;

    for row in 0..forecast.len() {
        println!(
            "  {}: {:.0}",
            forecast.date_at(row),
            forecast.rows()[row][0]
        );
    }

    println!("\nAs a DataFrame:");
    println!("{}", forecast.to_dataframe()?);

    Ok(())
}

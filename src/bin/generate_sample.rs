use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_parquet(path: &str, schema: Arc<Schema>, batch: RecordBatch) {
    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn generate_sales(rng: &mut SimpleRng, rows: usize) {
    let cities = ["Yangon", "Mandalay", "Naypyitaw"];
    let customer_types = ["Member", "Normal"];
    let genders = ["Male", "Female"];
    let product_lines = [
        "Food and beverages",
        "Health and beauty",
        "Electronic accessories",
        "Sports and travel",
        "Home and lifestyle",
        "Fashion accessories",
    ];

    let mut city = Vec::with_capacity(rows);
    let mut customer_type = Vec::with_capacity(rows);
    let mut gender = Vec::with_capacity(rows);
    let mut product_line = Vec::with_capacity(rows);
    let mut time = Vec::with_capacity(rows);
    let mut unit_price = Vec::with_capacity(rows);
    let mut total = Vec::with_capacity(rows);
    let mut rating = Vec::with_capacity(rows);
    let mut margin = Vec::with_capacity(rows);
    let mut income = Vec::with_capacity(rows);

    for _ in 0..rows {
        let price = 10.0 + rng.next_f64() * 90.0;
        let quantity = 1 + (rng.next_u64() % 10) as i64;
        let subtotal = price * quantity as f64;
        let tax = subtotal * 0.05;

        let hour = 10 + (rng.next_u64() % 11) as u32;
        let minute = (rng.next_u64() % 60) as u32;
        let second = (rng.next_u64() % 60) as u32;

        city.push(rng.pick(&cities).to_string());
        customer_type.push(rng.pick(&customer_types).to_string());
        gender.push(rng.pick(&genders).to_string());
        product_line.push(rng.pick(&product_lines).to_string());
        time.push(format!("{hour:02}:{minute:02}:{second:02}"));
        unit_price.push(price);
        total.push(subtotal + tax);
        rating.push(((4.0 + rng.next_f64() * 6.0) * 10.0).round() / 10.0);
        margin.push(4.761904762);
        income.push(tax);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("City", DataType::Utf8, false),
        Field::new("Customer_type", DataType::Utf8, false),
        Field::new("Gender", DataType::Utf8, false),
        Field::new("Product line", DataType::Utf8, false),
        Field::new("Time", DataType::Utf8, false),
        Field::new("Unit price", DataType::Float64, false),
        Field::new("Total", DataType::Float64, false),
        Field::new("Rating", DataType::Float64, false),
        Field::new("gross margin percentage", DataType::Float64, false),
        Field::new("gross income", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(city)),
            Arc::new(StringArray::from(customer_type)),
            Arc::new(StringArray::from(gender)),
            Arc::new(StringArray::from(product_line)),
            Arc::new(StringArray::from(time)),
            Arc::new(Float64Array::from(unit_price)),
            Arc::new(Float64Array::from(total)),
            Arc::new(Float64Array::from(rating)),
            Arc::new(Float64Array::from(margin)),
            Arc::new(Float64Array::from(income)),
        ],
    )
    .expect("Failed to create RecordBatch");

    write_parquet("sales_sample.parquet", schema, batch);
    println!("Wrote {rows} transactions to sales_sample.parquet");
}

fn generate_biomarkers(rng: &mut SimpleRng, rows: usize) {
    // (group, mean ptau217, mean nfl, mean gfap)
    let groups = [
        ("CU", 0.4, 15.0, 110.0),
        ("MCI", 0.9, 22.0, 160.0),
        ("AD", 1.9, 32.0, 230.0),
    ];

    let mut subj_id = Vec::with_capacity(rows);
    let mut grp = Vec::with_capacity(rows);
    let mut sex = Vec::with_capacity(rows);
    let mut age = Vec::with_capacity(rows);
    let mut ptau = Vec::with_capacity(rows);
    let mut nfl = Vec::with_capacity(rows);
    let mut gfap = Vec::with_capacity(rows);

    for i in 0..rows {
        let &(name, mu_ptau, mu_nfl, mu_gfap) = rng.pick(&groups);
        subj_id.push(1000 + i as i64);
        grp.push(name.to_string());
        sex.push(1 + (rng.next_u64() % 2) as i64);
        age.push(rng.gauss(71.0, 6.0).clamp(50.0, 95.0).round());
        ptau.push(rng.gauss(mu_ptau, mu_ptau * 0.25).max(0.05));
        nfl.push(rng.gauss(mu_nfl, mu_nfl * 0.2).max(2.0));
        gfap.push(rng.gauss(mu_gfap, mu_gfap * 0.2).max(20.0));
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("subj_id", DataType::Int64, false),
        Field::new("grp", DataType::Utf8, false),
        Field::new("sex", DataType::Int64, false),
        Field::new("age", DataType::Float64, false),
        Field::new("ptau217", DataType::Float64, false),
        Field::new("nfl", DataType::Float64, false),
        Field::new("gfap", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(subj_id)),
            Arc::new(StringArray::from(grp)),
            Arc::new(Int64Array::from(sex)),
            Arc::new(Float64Array::from(age)),
            Arc::new(Float64Array::from(ptau)),
            Arc::new(Float64Array::from(nfl)),
            Arc::new(Float64Array::from(gfap)),
        ],
    )
    .expect("Failed to create RecordBatch");

    write_parquet("biomarkers_sample.parquet", schema, batch);
    println!("Wrote {rows} measurements to biomarkers_sample.parquet");
}

fn main() {
    let mut rng = SimpleRng::new(42);
    generate_sales(&mut rng, 400);
    generate_biomarkers(&mut rng, 180);
}

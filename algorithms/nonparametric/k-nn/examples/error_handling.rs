//! Shows how the k-NN classifier reports its error conditions.

use k_nn::{KnnClassifier, KnnError};
use ndarray::array;
use pseudolab_helpers::L2Dist;

fn main() {
    println!("k-NN Classifier Error Handling Examples");
    println!("=======================================");

    let mut classifier: KnnClassifier<&str, f64, L2Dist> = KnnClassifier::new(L2Dist);

    println!("\n1. Predicting before any example is stored:");
    match classifier.predict(array![1.0, 1.0].view(), 3) {
        Ok(prediction) => println!("   Predicted label: {}", prediction.label),
        Err(KnnError::EmptyTrainingSet) => {
            println!("   Caught expected error: {}", KnnError::EmptyTrainingSet)
        }
        Err(e) => println!("   Unexpected error: {}", e),
    }

    for (features, label) in [
        (array![1.0, 1.0], "Class A"),
        (array![2.0, 2.0], "Class A"),
        (array![8.0, 8.0], "Class B"),
        (array![9.0, 8.0], "Class B"),
    ] {
        if let Err(e) = classifier.add_example(features, label) {
            println!("   Could not store example: {}", e);
        }
    }

    println!("\n2. Asking for zero neighbors:");
    if let Err(e) = classifier.predict(array![1.0, 1.0].view(), 0) {
        println!("   Caught expected error: {}", e);
    }

    println!("\n3. Storing a vector of the wrong length:");
    if let Err(e) = classifier.add_example(array![1.0, 2.0, 3.0], "Class C") {
        println!("   Caught expected error: {}", e);
    }

    println!("\n4. A successful prediction:");
    match classifier.predict(array![7.5, 8.5].view(), 3) {
        Ok(prediction) => {
            println!("   Predicted label: {}", prediction.label);
            for (label, confidence) in &prediction.confidences {
                println!("   {}: {:.2}", label, confidence);
            }
        }
        Err(e) => println!("   Prediction failed: {}", e),
    }
}

//! Static, hand-curated fallback question sets bundled with the application.
//!
//! The bank is the last sourcing tier: it answers when the remote question
//! source is unreachable or returns nothing usable. Pure data and lookup,
//! no I/O.

use crate::model::{ExamType, Question, QuestionId};

/// In-memory catalog of curated practice questions keyed by subject and
/// exam period.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    entries: Vec<BankEntry>,
}

#[derive(Debug, Clone)]
struct BankEntry {
    subject: String,
    exam_type: ExamType,
    questions: Vec<Question>,
}

impl QuestionBank {
    /// An empty bank, mainly useful in tests.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The bank shipped with the portal.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }

    /// Curated questions for a subject and exam period.
    ///
    /// Subject matching is case-insensitive. Returns an empty vector when the
    /// bank has nothing for the pair.
    #[must_use]
    pub fn curated(&self, subject: &str, exam_type: ExamType) -> Vec<Question> {
        self.entries
            .iter()
            .filter(|e| e.exam_type == exam_type && e.subject.eq_ignore_ascii_case(subject))
            .flat_map(|e| e.questions.iter().cloned())
            .collect()
    }

    /// All curated questions for a subject across both exam periods.
    ///
    /// Used as the fallback pool for lecture-range and free-topic requests,
    /// where an exam period is meaningless.
    #[must_use]
    pub fn curated_all(&self, subject: &str) -> Vec<Question> {
        self.entries
            .iter()
            .filter(|e| e.subject.eq_ignore_ascii_case(subject))
            .flat_map(|e| e.questions.iter().cloned())
            .collect()
    }

    /// Subjects the bank knows about, deduplicated, in insertion order.
    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !out.iter().any(|s| s.eq_ignore_ascii_case(&entry.subject)) {
                out.push(&entry.subject);
            }
        }
        out
    }
}

fn q(
    id: u64,
    text: &str,
    options: [&str; 4],
    correct: usize,
    explanation: &str,
    topic: &str,
) -> Question {
    Question::new(
        QuestionId::new(id),
        text,
        options.iter().map(|s| (*s).to_string()).collect(),
        correct,
        explanation,
        topic,
    )
    .expect("curated bank entries are well-formed")
}

fn builtin_entries() -> Vec<BankEntry> {
    vec![
        BankEntry {
            subject: "CS101".to_string(),
            exam_type: ExamType::Midterm,
            questions: vec![
                q(
                    101,
                    "Which component executes the fetch-decode-execute cycle?",
                    ["RAM", "CPU", "SSD", "GPU"],
                    1,
                    "The CPU drives the fetch-decode-execute cycle; memory and storage only hold data.",
                    "Hardware",
                ),
                q(
                    102,
                    "Which of these is volatile storage?",
                    ["Hard disk", "ROM", "RAM", "DVD"],
                    2,
                    "RAM loses its contents when power is cut; the others persist.",
                    "Hardware",
                ),
                q(
                    103,
                    "What does the ALU inside a processor do?",
                    [
                        "Schedules processes",
                        "Performs arithmetic and logic operations",
                        "Caches disk blocks",
                        "Renders graphics",
                    ],
                    1,
                    "The arithmetic logic unit carries out arithmetic and boolean operations.",
                    "Hardware",
                ),
                q(
                    104,
                    "What is binary 1010 in decimal?",
                    ["8", "12", "10", "14"],
                    2,
                    "1010 = 8 + 0 + 2 + 0 = 10.",
                    "Number Systems",
                ),
                q(
                    105,
                    "How many distinct values can one byte represent?",
                    ["128", "255", "256", "512"],
                    2,
                    "A byte has 8 bits, giving 2^8 = 256 values (0 through 255).",
                    "Number Systems",
                ),
                q(
                    106,
                    "Hexadecimal F equals which decimal value?",
                    ["14", "15", "16", "17"],
                    1,
                    "Hex digits run 0-9 then A-F, so F is 15.",
                    "Number Systems",
                ),
            ],
        },
        BankEntry {
            subject: "CS101".to_string(),
            exam_type: ExamType::Final,
            questions: vec![
                q(
                    111,
                    "Which data structure gives O(1) average lookup by key?",
                    ["Linked list", "Hash table", "Binary heap", "Stack"],
                    1,
                    "Hash tables index by hashed key, averaging constant-time lookup.",
                    "Data Structures",
                ),
                q(
                    112,
                    "Which traversal of a binary search tree yields sorted order?",
                    ["Pre-order", "Post-order", "In-order", "Level-order"],
                    2,
                    "In-order traversal visits left subtree, node, right subtree.",
                    "Data Structures",
                ),
                q(
                    113,
                    "What is the worst-case complexity of binary search?",
                    ["O(1)", "O(log n)", "O(n)", "O(n log n)"],
                    1,
                    "Each probe halves the remaining range.",
                    "Algorithms",
                ),
                q(
                    114,
                    "Which sorting algorithm is stable?",
                    ["Quicksort", "Heapsort", "Merge sort", "Selection sort"],
                    2,
                    "Merge sort preserves the relative order of equal elements.",
                    "Algorithms",
                ),
            ],
        },
        BankEntry {
            subject: "MATH101".to_string(),
            exam_type: ExamType::Midterm,
            questions: vec![
                q(
                    201,
                    "What is the derivative of x^2?",
                    ["x", "2x", "x^2", "2"],
                    1,
                    "d/dx x^n = n * x^(n-1).",
                    "Differentiation",
                ),
                q(
                    202,
                    "What is the limit of (sin x)/x as x approaches 0?",
                    ["0", "1", "Infinity", "Undefined"],
                    1,
                    "A standard limit: sin x ~ x near zero.",
                    "Limits",
                ),
                q(
                    203,
                    "Which rule differentiates a product of two functions?",
                    ["Chain rule", "Quotient rule", "Product rule", "Power rule"],
                    2,
                    "(fg)' = f'g + fg'.",
                    "Differentiation",
                ),
            ],
        },
        BankEntry {
            subject: "MATH101".to_string(),
            exam_type: ExamType::Final,
            questions: vec![
                q(
                    211,
                    "What is the integral of 2x dx?",
                    ["x^2 + C", "2x^2 + C", "x + C", "2 + C"],
                    0,
                    "The antiderivative of 2x is x^2, plus a constant.",
                    "Integration",
                ),
                q(
                    212,
                    "The definite integral of a function over [a, a] equals?",
                    ["1", "a", "0", "Undefined"],
                    2,
                    "An interval of zero width encloses no area.",
                    "Integration",
                ),
            ],
        },
    ]
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

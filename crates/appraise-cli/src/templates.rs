pub const GITIGNORE: &str = "/.appraise/\n/evaluations.xlsx\n/evaluations.csv\n/evaluations.tsv\n*.db-shm\n*.db-wal\n";

use colored::*;

pub struct LogColors {}

impl LogColors {
    pub fn blue(text: &str) -> String {
        // #1E4A8C, municipal blue
        let blue = Color::TrueColor {
            r: 30,
            g: 74,
            b: 140,
        };

        text.color(blue).to_string()
    }

    pub fn green(text: &str) -> String {
        let green = Color::TrueColor {
            r: 4,
            g: 205,
            b: 155,
        };

        text.color(green).to_string()
    }

    pub fn alert(text: &str) -> String {
        let red = Color::TrueColor { r: 255, g: 0, b: 0 };

        text.color(red).to_string()
    }
}
